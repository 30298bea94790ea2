use axum::{Json, extract::Path, extract::State, http::StatusCode};

use crate::AppState;
use crate::handlers::error_response;
use crate::models::order::ErrorResponse;
use crate::models::path::PathViewResponse;
use crate::services::path_view;

pub async fn get_path_view(
    State(state): State<AppState>,
    Path((user_id, path_id)): Path<(i32, i32)>,
) -> Result<Json<PathViewResponse>, (StatusCode, Json<ErrorResponse>)> {
    let view = path_view::get_path_view(&state.db, user_id, path_id)
        .await
        .map_err(error_response)?;
    Ok(Json(view))
}
