use serde::{Deserialize, Serialize};

/// Domain events webhooks can subscribe to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WebhookEvent {
    UserRegistered,
    DeviceCreated,
    DeviceUpdated,
    DeviceDeleted,
    AccessRecorded,
    AccessEntry,
    AccessExit,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user.registered",
            Self::DeviceCreated => "device.created",
            Self::DeviceUpdated => "device.updated",
            Self::DeviceDeleted => "device.deleted",
            Self::AccessRecorded => "access.recorded",
            Self::AccessEntry => "access.entry",
            Self::AccessExit => "access.exit",
        }
    }
}

/// Envelope POSTed to subscribers; the HMAC signature covers its exact
/// serialized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub timestamp: String,
    pub data: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
