use axum::{Json, extract::Path, extract::State, http::StatusCode};

use crate::AppState;
use crate::entities::lesson_progress;
use crate::handlers::error_response;
use crate::models::order::ErrorResponse;
use crate::models::progress::{CompleteLessonResponse, WatchPositionRequest};
use crate::services::progress;

pub async fn record_watch_position(
    State(state): State<AppState>,
    Path((enrollment_id, lesson_id)): Path<(i32, i32)>,
    Json(payload): Json<WatchPositionRequest>,
) -> Result<Json<lesson_progress::Model>, (StatusCode, Json<ErrorResponse>)> {
    let row = progress::record_watch_position(&state.db, enrollment_id, lesson_id, payload.position)
        .await
        .map_err(error_response)?;
    Ok(Json(row))
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    Path((enrollment_id, lesson_id)): Path<(i32, i32)>,
) -> Result<Json<CompleteLessonResponse>, (StatusCode, Json<ErrorResponse>)> {
    let result = progress::complete_lesson(&state.db, &state.notifier, enrollment_id, lesson_id)
        .await
        .map_err(error_response)?;

    Ok(Json(CompleteLessonResponse {
        progress_percentage: result.progress_percentage,
        course_completed: result.course_completed,
        certificate: result.certificate,
    }))
}
