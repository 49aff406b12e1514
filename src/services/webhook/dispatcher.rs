use chrono::Utc;
use uuid::Uuid;

use crate::config::DbPool;
use crate::services::webhook::{
    DeliveryResult, WebhookDeliveryClient, WebhookEnvelope, WebhookError, WebhookEvent,
};

/// Consecutive failures after which a webhook is deactivated
pub const MAX_CONSECUTIVE_FAILURES: i64 = 10;

/// Fans domain events out to subscribed webhooks. Runs outside the critical
/// path of the triggering request: callers hand off via `tokio::spawn` after
/// their own write has committed, and nothing here ever propagates an error
/// back to them.
pub struct WebhookDispatcher {
    pool: DbPool,
    client: WebhookDeliveryClient,
}

/// Subset of the webhooks row the dispatcher works with
#[derive(Debug, sqlx::FromRow)]
struct Subscriber {
    id: String,
    url: String,
    secret: String,
    events: String,
    failure_count: i64,
}

impl WebhookDispatcher {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            client: WebhookDeliveryClient::new(),
        }
    }

    /// Deliver `event` to every active webhook subscribed to it. Deliveries
    /// run concurrently; a slow or dead endpoint neither delays nor fails the
    /// others.
    pub async fn trigger(&self, event: WebhookEvent, payload: serde_json::Value) {
        let subscribers = match self.subscribers_for(event).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to load webhooks for {}: {}", event.as_str(), e);
                return;
            }
        };

        if subscribers.is_empty() {
            return;
        }

        tracing::info!(
            "Triggering {} webhooks for event: {}",
            subscribers.len(),
            event.as_str()
        );

        let results = futures::future::join_all(
            subscribers
                .iter()
                .map(|webhook| self.send(webhook, event, payload.clone())),
        )
        .await;

        for (webhook, result) in subscribers.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!("Webhook {} delivery bookkeeping failed: {}", webhook.id, e);
            }
        }
    }

    async fn subscribers_for(&self, event: WebhookEvent) -> Result<Vec<Subscriber>, WebhookError> {
        let active: Vec<Subscriber> = sqlx::query_as(
            "SELECT id, url, secret, events, failure_count FROM webhooks WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;

        // Subscribed-event sets are stored as JSON arrays; filter here rather
        // than in SQL.
        Ok(active
            .into_iter()
            .filter(|w| {
                serde_json::from_str::<Vec<String>>(&w.events)
                    .map(|events| events.iter().any(|e| e == event.as_str()))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn send(
        &self,
        webhook: &Subscriber,
        event: WebhookEvent,
        payload: serde_json::Value,
    ) -> Result<(), WebhookError> {
        let envelope = WebhookEnvelope {
            event: event.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            data: payload,
        };
        let payload_json = serde_json::to_string(&envelope)?;

        let result = self
            .client
            .deliver(&webhook.url, &webhook.secret, event.as_str(), &payload_json)
            .await;

        if result.is_success() {
            tracing::info!("Webhook {} triggered successfully", webhook.id);
        } else {
            tracing::warn!(
                "Webhook {} failed: {}",
                webhook.id,
                result.error_message.as_deref().unwrap_or("unknown error")
            );
        }

        self.apply_outcome(webhook, &result).await?;
        self.log_attempt(webhook, event, &payload_json, &result).await?;

        Ok(())
    }

    async fn apply_outcome(
        &self,
        webhook: &Subscriber,
        result: &DeliveryResult,
    ) -> Result<(), WebhookError> {
        let (failure_count, is_active) =
            apply_delivery_outcome(webhook.failure_count, result.is_success());

        if !is_active {
            tracing::warn!(
                "Webhook {} disabled after {} consecutive failures",
                webhook.id,
                failure_count
            );
        }

        sqlx::query(
            r#"
            UPDATE webhooks
            SET failure_count = ?,
                is_active = ?,
                last_triggered_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(failure_count)
        .bind(is_active)
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(&webhook.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn log_attempt(
        &self,
        webhook: &Subscriber,
        event: WebhookEvent,
        payload_json: &str,
        result: &DeliveryResult,
    ) -> Result<(), WebhookError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_logs (id, webhook_id, event, payload, response_status, response_body, success, error_message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&webhook.id)
        .bind(event.as_str())
        .bind(payload_json)
        .bind(result.response_status)
        .bind(&result.response_body)
        .bind(result.is_success())
        .bind(&result.error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Counter transition for one delivery attempt: a success resets the counter,
/// a failure increments it, and the webhook deactivates once the counter
/// reaches the threshold. Returns (new_failure_count, still_active).
pub fn apply_delivery_outcome(failure_count: i64, success: bool) -> (i64, bool) {
    if success {
        return (0, true);
    }
    let next = failure_count + 1;
    (next, next < MAX_CONSECUTIVE_FAILURES)
}
