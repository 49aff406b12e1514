use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::access::model::{AccessRecord, AccessType};
use crate::modules::access::schema::AccessRecordDetail;
use crate::modules::devices::crud::{DeviceCrud, DeviceError};
use crate::modules::response::ErrorResponse;
use crate::services::authorization::{can_view_all_access, Role};
use crate::services::identity::AuthUser;

const DEFAULT_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Not authorized to register access for this device")]
    NotAuthorizedToScan,

    #[error("Not authorized to view this device's access history")]
    NotAuthorizedToView,

    #[error("Invalid access type '{0}': expected 'entrada' or 'salida'")]
    InvalidAccessType(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DeviceNotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorizedToScan | Self::NotAuthorizedToView => StatusCode::FORBIDDEN,
            Self::InvalidAccessType(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("access error: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<DeviceError> for AccessError {
    fn from(e: DeviceError) -> Self {
        match e {
            DeviceError::NotFound => Self::DeviceNotFound,
            DeviceError::Database(e) => Self::Database(e),
            // Ownership and serial conflicts never arise on the scan path
            other => {
                tracing::error!("unexpected device error during access handling: {}", other);
                Self::DeviceNotFound
            }
        }
    }
}

pub struct AccessCrud {
    pool: DbPool,
}

impl AccessCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The access decision path: resolve the device by QR, apply the role
    /// policy, normalize the access type, and persist an immutable record.
    /// The owner id is captured from the device now, so the record reflects
    /// ownership at scan time even if the device is later reassigned.
    pub async fn record_access(
        &self,
        qr_data: &str,
        access_type_raw: &str,
        location: Option<&str>,
        scanner: &AuthUser,
    ) -> Result<AccessRecord, AccessError> {
        let device = DeviceCrud::new(self.pool.clone()).get_by_qr(qr_data).await?;

        // Students may only log access for their own devices; security and
        // admin may scan any device.
        if scanner.role == Role::Student && device.user_id != scanner.id {
            return Err(AccessError::NotAuthorizedToScan);
        }

        let access_type = AccessType::parse(access_type_raw)
            .ok_or_else(|| AccessError::InvalidAccessType(access_type_raw.to_string()))?;

        let record = AccessRecord {
            id: Uuid::new_v4().to_string(),
            device_id: device.id,
            user_id: device.user_id,
            scanned_by: Some(scanner.id.clone()),
            access_type,
            timestamp: Utc::now(),
            location: location.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO access_records (id, device_id, user_id, scanned_by, access_type, timestamp, location)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.device_id)
        .bind(&record.user_id)
        .bind(&record.scanned_by)
        .bind(record.access_type)
        .bind(record.timestamp)
        .bind(&record.location)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// History for one device: the owner, security and admin may view it.
    pub async fn history_for_device(
        &self,
        device_id: &str,
        caller: &AuthUser,
        limit: Option<i64>,
    ) -> Result<Vec<AccessRecordDetail>, AccessError> {
        let device = DeviceCrud::new(self.pool.clone()).get(device_id).await?;

        if device.user_id != caller.id && !can_view_all_access(caller.role) {
            return Err(AccessError::NotAuthorizedToView);
        }

        let rows = sqlx::query_as::<_, AccessRecordDetail>(
            r#"
            SELECT ar.id, ar.device_id, ar.user_id, ar.scanned_by, ar.access_type, ar.timestamp, ar.location,
                   d.name AS device_name, d.serial_number,
                   owner.full_name AS owner_name,
                   scanner.full_name AS scanner_name
            FROM access_records ar
            JOIN devices d ON d.id = ar.device_id
            JOIN users owner ON owner.id = ar.user_id
            LEFT JOIN users scanner ON scanner.id = ar.scanned_by
            WHERE ar.device_id = ?
            ORDER BY ar.timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(device_id)
        .bind(limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Role-scoped history: security and admin see every record, everyone
    /// else only records for devices they own.
    pub async fn history_for_user(
        &self,
        caller: &AuthUser,
        limit: Option<i64>,
    ) -> Result<Vec<AccessRecordDetail>, AccessError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

        let rows = if can_view_all_access(caller.role) {
            sqlx::query_as::<_, AccessRecordDetail>(
                r#"
                SELECT ar.id, ar.device_id, ar.user_id, ar.scanned_by, ar.access_type, ar.timestamp, ar.location,
                       d.name AS device_name, d.serial_number,
                       owner.full_name AS owner_name,
                       scanner.full_name AS scanner_name
                FROM access_records ar
                JOIN devices d ON d.id = ar.device_id
                JOIN users owner ON owner.id = ar.user_id
                LEFT JOIN users scanner ON scanner.id = ar.scanned_by
                ORDER BY ar.timestamp DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, AccessRecordDetail>(
                r#"
                SELECT ar.id, ar.device_id, ar.user_id, ar.scanned_by, ar.access_type, ar.timestamp, ar.location,
                       d.name AS device_name, d.serial_number,
                       owner.full_name AS owner_name,
                       scanner.full_name AS scanner_name
                FROM access_records ar
                JOIN devices d ON d.id = ar.device_id
                JOIN users owner ON owner.id = ar.user_id
                LEFT JOIN users scanner ON scanner.id = ar.scanned_by
                WHERE ar.user_id = ?
                ORDER BY ar.timestamp DESC
                LIMIT ?
                "#,
            )
            .bind(&caller.id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows)
    }
}
