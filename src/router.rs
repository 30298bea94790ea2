use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{AppState, handlers};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/orders", post(handlers::orders::create_order))
        .route("/api/orders/{order_id}", get(handlers::orders::get_order))
        .route(
            "/api/users/{user_id}/orders",
            get(handlers::orders::get_user_orders),
        )
        .route(
            "/api/payments/callback",
            get(handlers::payments::payment_callback),
        )
        .route("/api/enrollments", post(handlers::enrollments::enroll_free))
        .route(
            "/api/enrollments/{enrollment_id}",
            get(handlers::enrollments::get_enrollment_progress),
        )
        .route(
            "/api/enrollments/{enrollment_id}/lessons/{lesson_id}/position",
            put(handlers::progress::record_watch_position),
        )
        .route(
            "/api/enrollments/{enrollment_id}/lessons/{lesson_id}/complete",
            post(handlers::progress::complete_lesson),
        )
        .route(
            "/api/users/{user_id}/paths/{path_id}",
            get(handlers::paths::get_path_view),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "CourseHub backend is running"
}
