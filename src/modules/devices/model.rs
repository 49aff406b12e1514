use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// `qr_data` is the opaque scan identifier: random, unique, immutable once
/// created, and independent of the serial number.
#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub device_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: String,
    pub photo: Option<String>,
    pub qr_data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
