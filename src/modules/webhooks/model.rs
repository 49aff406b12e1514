use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Webhook registration. `events` holds the subscribed-event set as a JSON
/// array; `failure_count` tracks consecutive delivery failures and the
/// dispatcher deactivates the webhook when it reaches the threshold.
#[derive(Debug, Clone, FromRow)]
pub struct Webhook {
    pub id: String,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub events: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub failure_count: i64,
}

impl Webhook {
    pub fn event_list(&self) -> Vec<String> {
        serde_json::from_str(&self.events).unwrap_or_default()
    }
}

/// Append-only record of one delivery attempt.
#[derive(Debug, Clone, FromRow)]
pub struct WebhookLog {
    pub id: String,
    pub webhook_id: String,
    pub event: String,
    pub payload: String,
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
