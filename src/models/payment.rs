use serde::{Deserialize, Serialize};

/// Inbound gateway callback, signed over its own non-signature parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackParams {
    pub order_id: i32,
    pub reference: String,
    /// "success" or "failed"
    pub status: String,
    pub payment_method: Option<String>,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCallbackResponse {
    pub order_id: i32,
    /// "confirmed", "alreadyCompleted" or "failed"
    pub outcome: String,
}
