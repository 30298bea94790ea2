use axum::{Json, extract::Path, extract::State, http::StatusCode};

use crate::AppState;
use crate::entities::orders;
use crate::handlers::error_response;
use crate::models::order::{CheckoutResponse, CreateOrderRequest, ErrorResponse, TargetType};
use crate::services::orders::{self as order_service, OrderTarget};

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), (StatusCode, Json<ErrorResponse>)> {
    let target = match payload.target_type {
        TargetType::Course => OrderTarget::Course(payload.target_id),
        TargetType::Path => OrderTarget::Path(payload.target_id),
    };

    let order = order_service::create_order(&state.db, payload.user_id, target)
        .await
        .map_err(error_response)?;
    let redirect_url = state
        .gateway
        .build_redirect_url(&order)
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order,
            redirect_url,
        }),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<Json<orders::Model>, (StatusCode, Json<ErrorResponse>)> {
    let order = order_service::get_order(&state.db, order_id)
        .await
        .map_err(error_response)?;
    Ok(Json(order))
}

pub async fn get_user_orders(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<orders::Model>>, (StatusCode, Json<ErrorResponse>)> {
    let orders = order_service::list_user_orders(&state.db, user_id)
        .await
        .map_err(error_response)?;
    Ok(Json(orders))
}
