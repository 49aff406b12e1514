use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::response::ErrorResponse;
use crate::modules::webhooks::model::{Webhook, WebhookLog};
use crate::services::tokens;
use crate::services::webhook::WebhookEvent;

const DEFAULT_LOGS_LIMIT: i64 = 50;

const KNOWN_EVENTS: &[WebhookEvent] = &[
    WebhookEvent::UserRegistered,
    WebhookEvent::DeviceCreated,
    WebhookEvent::DeviceUpdated,
    WebhookEvent::DeviceDeleted,
    WebhookEvent::AccessRecorded,
    WebhookEvent::AccessEntry,
    WebhookEvent::AccessExit,
];

#[derive(Debug, thiserror::Error)]
pub enum WebhookAdminError {
    #[error("Webhook not found")]
    NotFound,

    #[error("Access denied. Required permission: manage:webhooks")]
    AdminRequired,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl WebhookAdminError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AdminRequired => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookAdminError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("webhook admin error: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn validate_events(events: &[String]) -> Result<(), WebhookAdminError> {
    for event in events {
        if !KNOWN_EVENTS.iter().any(|k| k.as_str() == event) {
            return Err(WebhookAdminError::Validation(format!(
                "Unknown event '{}'",
                event
            )));
        }
    }
    Ok(())
}

pub struct WebhookCrud {
    pool: DbPool,
}

impl WebhookCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// A secret is generated when the caller does not supply one.
    pub async fn create(
        &self,
        name: &str,
        url: &str,
        events: &[String],
        secret: Option<&str>,
        created_by: &str,
    ) -> Result<Webhook, WebhookAdminError> {
        validate_events(events)?;

        let now = Utc::now();
        let webhook = Webhook {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            url: url.to_string(),
            secret: secret
                .map(str::to_string)
                .unwrap_or_else(tokens::generate_opaque_token),
            events: serde_json::to_string(events)
                .map_err(|e| WebhookAdminError::Validation(e.to_string()))?,
            is_active: true,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            last_triggered_at: None,
            failure_count: 0,
        };

        sqlx::query(
            r#"
            INSERT INTO webhooks (id, name, url, secret, events, is_active, created_by, created_at, updated_at, last_triggered_at, failure_count)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&webhook.id)
        .bind(&webhook.name)
        .bind(&webhook.url)
        .bind(&webhook.secret)
        .bind(&webhook.events)
        .bind(webhook.is_active)
        .bind(&webhook.created_by)
        .bind(webhook.created_at)
        .bind(webhook.updated_at)
        .bind(webhook.last_triggered_at)
        .bind(webhook.failure_count)
        .execute(&self.pool)
        .await?;

        tracing::info!("Webhook created: {} - {}", webhook.id, webhook.name);

        Ok(webhook)
    }

    pub async fn list(&self) -> Result<Vec<Webhook>, WebhookAdminError> {
        let webhooks =
            sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(webhooks)
    }

    pub async fn get(&self, webhook_id: &str) -> Result<Webhook, WebhookAdminError> {
        sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = ?")
            .bind(webhook_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(WebhookAdminError::NotFound)
    }

    /// Reactivation (is_active = true) also clears the failure counter so a
    /// repaired endpoint starts fresh.
    pub async fn update(
        &self,
        webhook_id: &str,
        name: Option<&str>,
        url: Option<&str>,
        events: Option<&[String]>,
        is_active: Option<bool>,
    ) -> Result<Webhook, WebhookAdminError> {
        let mut webhook = self.get(webhook_id).await?;

        if let Some(name) = name {
            webhook.name = name.to_string();
        }
        if let Some(url) = url {
            webhook.url = url.to_string();
        }
        if let Some(events) = events {
            validate_events(events)?;
            webhook.events = serde_json::to_string(events)
                .map_err(|e| WebhookAdminError::Validation(e.to_string()))?;
        }
        if let Some(active) = is_active {
            if active && !webhook.is_active {
                webhook.failure_count = 0;
            }
            webhook.is_active = active;
        }
        webhook.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE webhooks
            SET name = ?, url = ?, events = ?, is_active = ?, failure_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&webhook.name)
        .bind(&webhook.url)
        .bind(&webhook.events)
        .bind(webhook.is_active)
        .bind(webhook.failure_count)
        .bind(webhook.updated_at)
        .bind(&webhook.id)
        .execute(&self.pool)
        .await?;

        Ok(webhook)
    }

    pub async fn delete(&self, webhook_id: &str) -> Result<(), WebhookAdminError> {
        let webhook = self.get(webhook_id).await?;

        sqlx::query("DELETE FROM webhook_logs WHERE webhook_id = ?")
            .bind(&webhook.id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM webhooks WHERE id = ?")
            .bind(&webhook.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn logs(
        &self,
        webhook_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<WebhookLog>, WebhookAdminError> {
        // 404 for an unknown webhook rather than an empty list
        self.get(webhook_id).await?;

        let logs = sqlx::query_as::<_, WebhookLog>(
            "SELECT * FROM webhook_logs WHERE webhook_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(webhook_id)
        .bind(limit.unwrap_or(DEFAULT_LOGS_LIMIT))
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
