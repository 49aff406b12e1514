use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two recordable access types, stored and exposed with their domain
/// literals ("entrada"/"salida").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AccessType {
    Entrada,
    Salida,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrada => "entrada",
            Self::Salida => "salida",
        }
    }

    /// Normalize a raw client value: whitespace and case are forgiven, any
    /// other literal is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entrada" => Some(Self::Entrada),
            "salida" => Some(Self::Salida),
            _ => None,
        }
    }
}

/// Immutable audit-log entry for one entry/exit event. `user_id` is the
/// device's owner captured at scan time; `scanned_by` is the identity that
/// performed the scan (nullable for system-originated records).
#[derive(Debug, Clone, FromRow)]
pub struct AccessRecord {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub scanned_by: Option<String>,
    pub access_type: AccessType,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
}
