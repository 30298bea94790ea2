//! Payment gateway boundary and the payment-confirmation commit step.
//!
//! The server's role against the gateway is limited to building an outbound
//! redirect target and verifying the inbound callback's signature over its
//! own parameters; the settlement commit is a single database transaction.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use sha2::Sha256;
use std::env;

use crate::entities::orders::OrderStatus;
use crate::entities::transactions::TransactionStatus;
use crate::entities::{orders, prelude::*, transactions};
use crate::services::error::DomainError;
use crate::services::fulfillment;
use crate::services::notifications::NotificationService;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct PaymentGatewayService {
    gateway_url: String,
    callback_url: String,
    secret: String,
}

impl PaymentGatewayService {
    pub fn new(gateway_url: String, callback_url: String, secret: String) -> Self {
        Self {
            gateway_url,
            callback_url,
            secret,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env::var("PAYMENT_GATEWAY_URL").expect("PAYMENT_GATEWAY_URL must be set"),
            env::var("PAYMENT_CALLBACK_URL").expect("PAYMENT_CALLBACK_URL must be set"),
            env::var("PAYMENT_GATEWAY_SECRET").expect("PAYMENT_GATEWAY_SECRET must be set"),
        )
    }

    /// Canonical signing string: non-signature params as key=value pairs,
    /// sorted by key, joined with '&'
    fn canonical_string(params: &[(&str, &str)]) -> String {
        let mut pairs: Vec<&(&str, &str)> =
            params.iter().filter(|(k, _)| *k != "signature").collect();
        pairs.sort_by_key(|(k, _)| *k);
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(Self::canonical_string(params).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a hex-encoded HMAC-SHA256 signature over the given params.
    /// Constant-time comparison via `Mac::verify_slice`.
    pub fn verify(&self, params: &[(&str, &str)], signature: &str) -> bool {
        let Ok(raw) = hex::decode(signature) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(Self::canonical_string(params).as_bytes());
        mac.verify_slice(&raw).is_ok()
    }

    /// Outbound redirect target encoding orderId, amount and our callback
    /// address, signed with the shared gateway secret.
    pub fn build_redirect_url(&self, order: &orders::Model) -> Result<String, DomainError> {
        let order_id = order.id.to_string();
        let amount = order.total_amount_cents.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("callback", self.callback_url.as_str()),
            ("orderId", order_id.as_str()),
        ];
        let signature = self.sign(&params);

        let url = reqwest::Url::parse_with_params(
            &format!("{}/checkout", self.gateway_url),
            [
                ("orderId", order_id.as_str()),
                ("amount", amount.as_str()),
                ("callback", self.callback_url.as_str()),
                ("signature", signature.as_str()),
            ],
        )
        .map_err(|e| DomainError::GatewayConfig(e.to_string()))?;
        Ok(url.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// This call flipped the order to completed and fulfilled it
    Confirmed,
    /// The order had already been settled; nothing changed
    AlreadyCompleted,
}

/// Commit a confirmed payment: atomically flip the order, append the
/// settlement transaction and fulfill enrollments.
///
/// Idempotent: a second call for the same order takes the no-op path. The
/// status flip is a conditional update so only one of two concurrent callers
/// proceeds past the guard.
pub async fn confirm_payment(
    db: &DatabaseConnection,
    notifier: &NotificationService,
    order_id: i32,
    payment_method: Option<String>,
    reference: Option<String>,
) -> Result<PaymentOutcome, DomainError> {
    let order = Orders::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "order",
            id: order_id,
        })?;

    if order.status == OrderStatus::Completed {
        tracing::info!("order {} already completed, skipping settlement", order_id);
        return Ok(PaymentOutcome::AlreadyCompleted);
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    if now > order.expires_at {
        return Err(DomainError::OrderExpired);
    }

    let txn = db.begin().await?;

    let flipped = Orders::update_many()
        .col_expr(orders::Column::Status, Expr::value(OrderStatus::Completed))
        .col_expr(orders::Column::CompletedAt, Expr::value(Some(now)))
        .filter(orders::Column::Id.eq(order_id))
        .filter(orders::Column::Status.eq(OrderStatus::Pending))
        .exec(&txn)
        .await?;

    if flipped.rows_affected == 0 {
        // Lost the race to a concurrent confirmation
        txn.rollback().await?;
        let current = Orders::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "order",
                id: order_id,
            })?;
        return if current.status == OrderStatus::Completed {
            Ok(PaymentOutcome::AlreadyCompleted)
        } else {
            Err(DomainError::OrderNotPending)
        };
    }

    transactions::ActiveModel {
        order_id: Set(order_id),
        amount_cents: Set(order.total_amount_cents),
        status: Set(TransactionStatus::Completed),
        payment_method: Set(payment_method),
        reference: Set(reference),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let events = fulfillment::fulfill(&txn, &order).await?;

    txn.commit().await?;
    tracing::info!("order {} settled", order_id);

    // Best-effort, only after the settlement is durable
    notifier.notify_all(events).await;

    Ok(PaymentOutcome::Confirmed)
}
