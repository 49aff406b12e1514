use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{AccessRecord, AccessType};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub qr_data: String,
    pub access_type: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AccessRecordResponse {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub scanned_by: Option<String>,
    pub access_type: AccessType,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
}

impl From<AccessRecord> for AccessRecordResponse {
    fn from(record: AccessRecord) -> Self {
        Self {
            id: record.id,
            device_id: record.device_id,
            user_id: record.user_id,
            scanned_by: record.scanned_by,
            access_type: record.access_type,
            timestamp: record.timestamp,
            location: record.location,
        }
    }
}

/// History row enriched at read time with display names; nothing here is
/// stored on the record itself.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AccessRecordDetail {
    pub id: String,
    pub device_id: String,
    pub user_id: String,
    pub scanned_by: Option<String>,
    pub access_type: AccessType,
    pub timestamp: DateTime<Utc>,
    pub location: Option<String>,
    pub device_name: String,
    pub serial_number: String,
    pub owner_name: String,
    pub scanner_name: Option<String>,
}
