use axum::{Json, http::StatusCode};

use crate::models::order::ErrorResponse;
use crate::services::error::DomainError;

pub mod enrollments;
pub mod orders;
pub mod paths;
pub mod payments;
pub mod progress;

/// Map the domain error taxonomy onto HTTP statuses; messages are already
/// user-displayable.
pub(crate) fn error_response(err: DomainError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AlreadyEnrolled
        | DomainError::DuplicatePendingOrder
        | DomainError::SelfPurchase => StatusCode::CONFLICT,
        DomainError::NotPurchasable
        | DomainError::PurchaseRequired
        | DomainError::QuizNotPassed { .. }
        | DomainError::OrderExpired
        | DomainError::OrderNotPending => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::GatewayVerificationFailed => StatusCode::BAD_REQUEST,
        DomainError::GatewayConfig(_) | DomainError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("internal error: {}", err);
    }

    (status, Json(ErrorResponse { error: err.to_string() }))
}
