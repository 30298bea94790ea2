//! Fire-and-forget notification collaborator.
//!
//! Delivery is best-effort: failures are logged and swallowed, never rolled
//! back into the fulfillment transaction.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum DomainEvent {
    #[serde(rename_all = "camelCase")]
    CourseEnrolled { user_id: i32, course_id: i32 },
    #[serde(rename_all = "camelCase")]
    CertificateIssued { enrollment_id: i32 },
}

#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl NotificationService {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Reads NOTIFIER_URL; unset means events are logged and dropped
    pub fn from_env() -> Self {
        Self::new(std::env::var("NOTIFIER_URL").ok())
    }

    pub async fn notify(&self, event: DomainEvent) {
        let Some(endpoint) = &self.endpoint else {
            tracing::debug!("notifier not configured, dropping event {:?}", event);
            return;
        };

        match self.client.post(endpoint).json(&event).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("delivered event {:?}", event);
            }
            Ok(resp) => {
                tracing::warn!("notifier returned {} for event {:?}", resp.status(), event);
            }
            Err(e) => {
                tracing::warn!("failed to deliver event {:?}: {}", event, e);
            }
        }
    }

    pub async fn notify_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.notify(event).await;
        }
    }
}
