use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::{Webhook, WebhookLog};

#[derive(Debug, Deserialize, Validate)]
pub struct WebhookCreateRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
    #[validate(length(min = 1, message = "At least one event is required"))]
    pub events: Vec<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WebhookUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(url(message = "Invalid URL"))]
    pub url: Option<String>,
    pub events: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub secret: String,
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub failure_count: i64,
}

impl From<Webhook> for WebhookResponse {
    fn from(webhook: Webhook) -> Self {
        let events = webhook.event_list();
        Self {
            id: webhook.id,
            name: webhook.name,
            url: webhook.url,
            secret: webhook.secret,
            events,
            is_active: webhook.is_active,
            created_by: webhook.created_by,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
            last_triggered_at: webhook.last_triggered_at,
            failure_count: webhook.failure_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookLogResponse {
    pub id: String,
    pub webhook_id: String,
    pub event: String,
    pub payload: serde_json::Value,
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<WebhookLog> for WebhookLogResponse {
    fn from(log: WebhookLog) -> Self {
        let payload = serde_json::from_str(&log.payload)
            .unwrap_or(serde_json::Value::String(log.payload.clone()));
        Self {
            id: log.id,
            webhook_id: log.webhook_id,
            event: log.event,
            payload,
            response_status: log.response_status,
            response_body: log.response_body,
            success: log.success,
            error_message: log.error_message,
            created_at: log.created_at,
        }
    }
}
