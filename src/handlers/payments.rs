use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::AppState;
use crate::handlers::error_response;
use crate::models::order::ErrorResponse;
use crate::models::payment::{PaymentCallbackParams, PaymentCallbackResponse};
use crate::services::error::DomainError;
use crate::services::payments::{self, PaymentOutcome};

/// Gateway return callback. The signature over the callback's own parameters
/// is verified before `status=success` is trusted; an invalid signature is a
/// hard failure with no state change.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(params): Query<PaymentCallbackParams>,
) -> Result<Json<PaymentCallbackResponse>, (StatusCode, Json<ErrorResponse>)> {
    let order_id = params.order_id.to_string();
    let payment_method = params.payment_method.clone().unwrap_or_default();

    let mut signed_pairs: Vec<(&str, &str)> = vec![
        ("orderId", order_id.as_str()),
        ("reference", params.reference.as_str()),
        ("status", params.status.as_str()),
    ];
    if !payment_method.is_empty() {
        signed_pairs.push(("paymentMethod", payment_method.as_str()));
    }

    if !state.gateway.verify(&signed_pairs, &params.signature) {
        tracing::warn!(
            "rejected payment callback for order {}: bad signature",
            params.order_id
        );
        return Err(error_response(DomainError::GatewayVerificationFailed));
    }

    if params.status != "success" {
        tracing::warn!(
            "gateway reported failed payment for order {} (reference {})",
            params.order_id,
            params.reference
        );
        return Ok(Json(PaymentCallbackResponse {
            order_id: params.order_id,
            outcome: "failed".to_string(),
        }));
    }

    let outcome = payments::confirm_payment(
        &state.db,
        &state.notifier,
        params.order_id,
        params.payment_method.clone(),
        Some(params.reference.clone()),
    )
    .await
    .map_err(error_response)?;

    Ok(Json(PaymentCallbackResponse {
        order_id: params.order_id,
        outcome: match outcome {
            PaymentOutcome::Confirmed => "confirmed".to_string(),
            PaymentOutcome::AlreadyCompleted => "alreadyCompleted".to_string(),
        },
    }))
}
