use axum::{Json, extract::Path, extract::State, http::StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::AppState;
use crate::entities::{enrollments, lesson_progress, prelude::*};
use crate::handlers::error_response;
use crate::models::enrollment::{EnrollFreeRequest, EnrollmentProgressResponse};
use crate::models::order::ErrorResponse;
use crate::services::error::DomainError;
use crate::services::progress::{count_course_lessons, progress_percentage};
use crate::services::fulfillment;

pub async fn enroll_free(
    State(state): State<AppState>,
    Json(payload): Json<EnrollFreeRequest>,
) -> Result<(StatusCode, Json<enrollments::Model>), (StatusCode, Json<ErrorResponse>)> {
    let enrollment = fulfillment::enroll_free(
        &state.db,
        &state.notifier,
        payload.user_id,
        payload.course_id,
    )
    .await
    .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn get_enrollment_progress(
    State(state): State<AppState>,
    Path(enrollment_id): Path<i32>,
) -> Result<Json<EnrollmentProgressResponse>, (StatusCode, Json<ErrorResponse>)> {
    let enrollment = Enrollments::find_by_id(enrollment_id)
        .one(&state.db)
        .await
        .map_err(DomainError::from)
        .map_err(error_response)?
        .ok_or_else(|| {
            error_response(DomainError::NotFound {
                entity: "enrollment",
                id: enrollment_id,
            })
        })?;

    let course = Courses::find_by_id(enrollment.course_id)
        .one(&state.db)
        .await
        .map_err(DomainError::from)
        .map_err(error_response)?;

    let lessons = LessonProgress::find()
        .filter(lesson_progress::Column::EnrollmentId.eq(enrollment_id))
        .order_by_asc(lesson_progress::Column::LessonId)
        .all(&state.db)
        .await
        .map_err(DomainError::from)
        .map_err(error_response)?;

    let total_lessons = count_course_lessons(&state.db, enrollment.course_id)
        .await
        .map_err(error_response)?;
    let completed_lessons = lessons.iter().filter(|row| row.is_completed).count() as u64;

    Ok(Json(EnrollmentProgressResponse {
        course_title: course.map(|c| c.title).unwrap_or_default(),
        progress_percentage: progress_percentage(completed_lessons, total_lessons),
        total_lessons,
        completed_lessons,
        lessons,
        enrollment,
    }))
}
