use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::auth::crud::is_unique_violation;
use crate::modules::devices::model::Device;
use crate::modules::response::ErrorResponse;
use crate::services::tokens;

/// QR collisions are negligible with 256-bit tokens; the retry only covers
/// the constraint firing anyway.
const QR_GENERATION_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device not found")]
    NotFound,

    #[error("Not authorized to {0} this device")]
    NotOwner(&'static str),

    #[error("Device with this serial number already exists")]
    SerialExists,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotOwner(_) => StatusCode::FORBIDDEN,
            Self::SerialExists => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DeviceError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("device error: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub struct DeviceCrud {
    pool: DbPool,
}

impl DeviceCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Device and QR identifier are persisted in the same insert. The serial
    /// pre-check is an early fail; the unique constraint is the safety
    /// mechanism for concurrent registrations.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        device_type: &str,
        brand: Option<&str>,
        model: Option<&str>,
        serial_number: &str,
        photo: Option<&str>,
    ) -> Result<Device, DeviceError> {
        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM devices WHERE serial_number = ?")
                .bind(serial_number)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(DeviceError::SerialExists);
        }

        let mut attempts = 0;
        loop {
            let now = Utc::now();
            let device = Device {
                id: Uuid::new_v4().to_string(),
                user_id: owner_id.to_string(),
                name: name.to_string(),
                device_type: device_type.to_string(),
                brand: brand.map(str::to_string),
                model: model.map(str::to_string),
                serial_number: serial_number.to_string(),
                photo: photo.map(str::to_string),
                qr_data: tokens::generate_opaque_token(),
                created_at: now,
                updated_at: now,
            };

            let result = sqlx::query(
                r#"
                INSERT INTO devices (id, user_id, name, device_type, brand, model, serial_number, photo, qr_data, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&device.id)
            .bind(&device.user_id)
            .bind(&device.name)
            .bind(&device.device_type)
            .bind(&device.brand)
            .bind(&device.model)
            .bind(&device.serial_number)
            .bind(&device.photo)
            .bind(&device.qr_data)
            .bind(device.created_at)
            .bind(device.updated_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => return Ok(device),
                Err(e) if is_unique_violation(&e) => {
                    let message = e.to_string();
                    if message.contains("qr_data") && attempts < QR_GENERATION_ATTEMPTS {
                        attempts += 1;
                        continue;
                    }
                    return Err(DeviceError::SerialExists);
                }
                Err(e) => return Err(DeviceError::Database(e)),
            }
        }
    }

    pub async fn get(&self, device_id: &str) -> Result<Device, DeviceError> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = ?")
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DeviceError::NotFound)
    }

    /// Lookup path used by every scan.
    pub async fn get_by_qr(&self, qr_data: &str) -> Result<Device, DeviceError> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE qr_data = ?")
            .bind(qr_data)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DeviceError::NotFound)
    }

    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Device>, DeviceError> {
        let devices =
            sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE user_id = ? ORDER BY created_at DESC")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(devices)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        device_id: &str,
        caller_id: &str,
        name: Option<&str>,
        device_type: Option<&str>,
        brand: Option<&str>,
        model: Option<&str>,
        serial_number: Option<&str>,
        photo: Option<&str>,
    ) -> Result<Device, DeviceError> {
        let mut device = self.get(device_id).await?;

        if device.user_id != caller_id {
            return Err(DeviceError::NotOwner("update"));
        }

        if let Some(name) = name {
            device.name = name.to_string();
        }
        if let Some(device_type) = device_type {
            device.device_type = device_type.to_string();
        }
        if let Some(brand) = brand {
            device.brand = Some(brand.to_string());
        }
        if let Some(model) = model {
            device.model = Some(model.to_string());
        }
        if let Some(serial) = serial_number {
            device.serial_number = serial.to_string();
        }
        if let Some(photo) = photo {
            device.photo = Some(photo.to_string());
        }
        device.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE devices
            SET name = ?, device_type = ?, brand = ?, model = ?, serial_number = ?, photo = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&device.name)
        .bind(&device.device_type)
        .bind(&device.brand)
        .bind(&device.model)
        .bind(&device.serial_number)
        .bind(&device.photo)
        .bind(device.updated_at)
        .bind(&device.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DeviceError::SerialExists
            } else {
                DeviceError::Database(e)
            }
        })?;

        Ok(device)
    }

    /// Cascades to the device's access records via the schema.
    pub async fn delete(&self, device_id: &str, caller_id: &str) -> Result<Device, DeviceError> {
        let device = self.get(device_id).await?;

        if device.user_id != caller_id {
            return Err(DeviceError::NotOwner("delete"));
        }

        sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(&device.id)
            .execute(&self.pool)
            .await?;

        Ok(device)
    }
}
