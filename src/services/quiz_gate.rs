//! Quiz gate: a lesson with a quiz can only be completed once the user has a
//! passing attempt for that quiz.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::{prelude::*, quiz_attempts, quizzes};
use crate::services::error::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub enum QuizGate {
    /// Lesson has no associated quiz
    NoQuiz,
    Passed,
    NotPassed {
        quiz_title: String,
        passing_score: i32,
    },
}

pub async fn check<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    lesson_id: i32,
) -> Result<QuizGate, DomainError> {
    let quiz = Quizzes::find()
        .filter(quizzes::Column::LessonId.eq(lesson_id))
        .one(conn)
        .await?;

    let Some(quiz) = quiz else {
        return Ok(QuizGate::NoQuiz);
    };

    // An attempt passes when score >= passing_score; the attempt recorder
    // stores that verdict in the `passed` flag.
    let passing_attempt = QuizAttempts::find()
        .filter(quiz_attempts::Column::QuizId.eq(quiz.id))
        .filter(quiz_attempts::Column::UserId.eq(user_id))
        .filter(quiz_attempts::Column::Passed.eq(true))
        .one(conn)
        .await?;

    if passing_attempt.is_some() {
        Ok(QuizGate::Passed)
    } else {
        Ok(QuizGate::NotPassed {
            quiz_title: quiz.title,
            passing_score: quiz.passing_score,
        })
    }
}
