//! Domain error taxonomy for the purchase-to-completion pipeline
//!
//! Variant messages are user-displayable; handlers map variants to HTTP
//! status codes in `handlers::error_response`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("You are already enrolled in this item")]
    AlreadyEnrolled,

    #[error("You already have a pending order for this item")]
    DuplicatePendingOrder,

    #[error("Instructors cannot purchase their own course")]
    SelfPurchase,

    #[error("This item is not available for purchase")]
    NotPurchasable,

    #[error("This course requires purchase before enrollment")]
    PurchaseRequired,

    #[error("You must pass the quiz \"{quiz_title}\" (score {passing_score} or higher) to complete this lesson")]
    QuizNotPassed {
        quiz_title: String,
        passing_score: i32,
    },

    #[error("This order has expired; please place a new one")]
    OrderExpired,

    #[error("Order is no longer payable")]
    OrderNotPending,

    #[error("Payment callback signature verification failed")]
    GatewayVerificationFailed,

    #[error("Gateway configuration error: {0}")]
    GatewayConfig(String),

    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}
