//! Progress tracker: per-lesson watch state, quiz-gated lesson completion,
//! course-progress recompute and the one-way enrollment completion flip.

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

use crate::entities::enrollments::EnrollmentStatus;
use crate::entities::{
    certificates, course_modules, enrollments, lesson_progress, lessons, path_courses,
    path_enrollments, prelude::*,
};
use crate::services::certificates as certificate_issuer;
use crate::services::error::DomainError;
use crate::services::notifications::{DomainEvent, NotificationService};
use crate::services::quiz_gate::{self, QuizGate};

#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub progress_percentage: i32,
    pub course_completed: bool,
    pub certificate: Option<certificates::Model>,
}

/// floor(completed / total * 100); integer truncation, not rounding
pub fn progress_percentage(completed: u64, total: u64) -> i32 {
    if total == 0 {
        return 0;
    }
    ((completed * 100) / total) as i32
}

/// Upsert the watch position for a lesson; no completion semantics. Also
/// remembers the lesson as the enrollment's last viewed one.
pub async fn record_watch_position(
    db: &DatabaseConnection,
    enrollment_id: i32,
    lesson_id: i32,
    position: i32,
) -> Result<lesson_progress::Model, DomainError> {
    let enrollment = find_enrollment(db, enrollment_id).await?;
    ensure_lesson_in_course(db, enrollment.course_id, lesson_id).await?;

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    // Upsert against the (enrollment, lesson) unique index; a concurrent
    // writer for the same pair lands on the conflict arm instead of
    // aborting on the index. Completion state is never touched here.
    LessonProgress::insert(lesson_progress::ActiveModel {
        enrollment_id: Set(enrollment_id),
        lesson_id: Set(lesson_id),
        is_completed: Set(false),
        last_watched_position: Set(position),
        last_accessed_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            lesson_progress::Column::EnrollmentId,
            lesson_progress::Column::LessonId,
        ])
        .update_columns([
            lesson_progress::Column::LastWatchedPosition,
            lesson_progress::Column::LastAccessedAt,
        ])
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    let row = find_progress_row(db, enrollment_id, lesson_id)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "progress for lesson",
            id: lesson_id,
        })?;

    let mut active = enrollment.into_active_model();
    active.last_viewed_lesson_id = Set(Some(lesson_id));
    active.update(db).await?;

    Ok(row)
}

/// Mark a lesson complete (quiz-gated), recompute course progress and detect
/// course completion. The completion flip is one-way; re-completing an
/// already-complete enrollment is a no-op.
pub async fn complete_lesson(
    db: &DatabaseConnection,
    notifier: &NotificationService,
    enrollment_id: i32,
    lesson_id: i32,
) -> Result<CompletionResult, DomainError> {
    let enrollment = find_enrollment(db, enrollment_id).await?;
    ensure_lesson_in_course(db, enrollment.course_id, lesson_id).await?;

    match quiz_gate::check(db, enrollment.user_id, lesson_id).await? {
        QuizGate::NotPassed {
            quiz_title,
            passing_score,
        } => {
            return Err(DomainError::QuizNotPassed {
                quiz_title,
                passing_score,
            });
        }
        QuizGate::NoQuiz | QuizGate::Passed => {}
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let txn = db.begin().await?;

    // Idempotent upsert on the (enrollment, lesson) unique index: completing
    // twice cannot double-count, and a concurrent completion for the same
    // pair takes the conflict arm instead of aborting the transaction. An
    // existing watch position survives the flip.
    LessonProgress::insert(lesson_progress::ActiveModel {
        enrollment_id: Set(enrollment_id),
        lesson_id: Set(lesson_id),
        is_completed: Set(true),
        last_watched_position: Set(0),
        last_accessed_at: Set(now),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            lesson_progress::Column::EnrollmentId,
            lesson_progress::Column::LessonId,
        ])
        .update_columns([
            lesson_progress::Column::IsCompleted,
            lesson_progress::Column::LastAccessedAt,
        ])
        .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    let total = count_course_lessons(&txn, enrollment.course_id).await?;
    let completed = LessonProgress::find()
        .filter(lesson_progress::Column::EnrollmentId.eq(enrollment_id))
        .filter(lesson_progress::Column::IsCompleted.eq(true))
        .count(&txn)
        .await?;
    let percentage = progress_percentage(completed, total);

    let mut course_completed = false;
    let mut certificate = None;
    let mut newly_issued = false;

    if total > 0 && completed >= total {
        course_completed = true;

        Enrollments::update_many()
            .col_expr(
                enrollments::Column::Status,
                Expr::value(EnrollmentStatus::Completed),
            )
            .col_expr(enrollments::Column::CompletedAt, Expr::value(Some(now)))
            .filter(enrollments::Column::Id.eq(enrollment_id))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Active))
            .exec(&txn)
            .await?;

        let (cert, created) = certificate_issuer::issue_if_absent(&txn, enrollment_id).await?;
        newly_issued = created;
        certificate = Some(cert);

        update_path_progress(&txn, enrollment.user_id, enrollment.course_id, now).await?;

        tracing::info!(
            "enrollment {} completed course {} ({}/{} lessons)",
            enrollment_id,
            enrollment.course_id,
            completed,
            total
        );
    }

    txn.commit().await?;

    if newly_issued {
        notifier
            .notify(DomainEvent::CertificateIssued { enrollment_id })
            .await;
    }

    Ok(CompletionResult {
        progress_percentage: percentage,
        course_completed,
        certificate,
    })
}

/// Lessons across all modules of the course
pub async fn count_course_lessons<C: ConnectionTrait>(
    conn: &C,
    course_id: i32,
) -> Result<u64, DomainError> {
    let module_ids: Vec<i32> = CourseModules::find()
        .filter(course_modules::Column::CourseId.eq(course_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|module| module.id)
        .collect();
    if module_ids.is_empty() {
        return Ok(0);
    }

    Ok(Lessons::find()
        .filter(lessons::Column::ModuleId.is_in(module_ids))
        .count(conn)
        .await?)
}

pub async fn count_completed_lessons<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: i32,
) -> Result<u64, DomainError> {
    Ok(LessonProgress::find()
        .filter(lesson_progress::Column::EnrollmentId.eq(enrollment_id))
        .filter(lesson_progress::Column::IsCompleted.eq(true))
        .count(conn)
        .await?)
}

async fn find_enrollment(
    db: &DatabaseConnection,
    enrollment_id: i32,
) -> Result<enrollments::Model, DomainError> {
    Enrollments::find_by_id(enrollment_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "enrollment",
            id: enrollment_id,
        })
}

async fn find_progress_row<C: ConnectionTrait>(
    conn: &C,
    enrollment_id: i32,
    lesson_id: i32,
) -> Result<Option<lesson_progress::Model>, DomainError> {
    Ok(LessonProgress::find()
        .filter(lesson_progress::Column::EnrollmentId.eq(enrollment_id))
        .filter(lesson_progress::Column::LessonId.eq(lesson_id))
        .one(conn)
        .await?)
}

/// The lesson must sit in one of the course's modules; counting a foreign
/// lesson would corrupt the completion threshold.
async fn ensure_lesson_in_course<C: ConnectionTrait>(
    conn: &C,
    course_id: i32,
    lesson_id: i32,
) -> Result<(), DomainError> {
    let lesson = Lessons::find_by_id(lesson_id)
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "lesson",
            id: lesson_id,
        })?;

    let module = CourseModules::find_by_id(lesson.module_id)
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "module",
            id: lesson.module_id,
        })?;

    if module.course_id != course_id {
        return Err(DomainError::NotFound {
            entity: "lesson in course",
            id: lesson_id,
        });
    }
    Ok(())
}

/// Roll a completed course up into the user's path enrollments that contain
/// it; a path completes when all of its courses are completed.
async fn update_path_progress<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    course_id: i32,
    now: sea_orm::prelude::DateTimeWithTimeZone,
) -> Result<(), DomainError> {
    let memberships = PathCourses::find()
        .filter(path_courses::Column::CourseId.eq(course_id))
        .all(conn)
        .await?;

    for membership in memberships {
        let path_enrollment = PathEnrollments::find()
            .filter(path_enrollments::Column::UserId.eq(user_id))
            .filter(path_enrollments::Column::PathId.eq(membership.path_id))
            .one(conn)
            .await?;
        let Some(path_enrollment) = path_enrollment else {
            continue;
        };

        let course_ids: Vec<i32> = PathCourses::find()
            .filter(path_courses::Column::PathId.eq(membership.path_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|pc| pc.course_id)
            .collect();
        let total = course_ids.len() as u64;
        let completed = Enrollments::find()
            .filter(enrollments::Column::UserId.eq(user_id))
            .filter(enrollments::Column::CourseId.is_in(course_ids))
            .filter(enrollments::Column::Status.eq(EnrollmentStatus::Completed))
            .count(conn)
            .await?;
        let percentage = progress_percentage(completed, total);

        let was_active = path_enrollment.status == EnrollmentStatus::Active;
        let mut active = path_enrollment.into_active_model();
        active.progress_percentage = Set(percentage);
        if percentage >= 100 && was_active {
            active.status = Set(EnrollmentStatus::Completed);
            active.completed_at = Set(Some(now));
        }
        active.update(conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::progress_percentage;

    #[test]
    fn percentage_truncates_instead_of_rounding() {
        // 2/3 = 66.67 -> 66
        assert_eq!(progress_percentage(2, 3), 66);
        // 3/4 = 75
        assert_eq!(progress_percentage(3, 4), 75);
        // 5/6 = 83.33 -> 83
        assert_eq!(progress_percentage(5, 6), 83);
    }

    #[test]
    fn percentage_boundaries() {
        assert_eq!(progress_percentage(0, 4), 0);
        assert_eq!(progress_percentage(4, 4), 100);
        // course with no lessons never reports progress
        assert_eq!(progress_percentage(0, 0), 0);
    }
}
