use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::Device;

#[derive(Debug, Deserialize, Validate)]
pub struct DeviceCreateRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Device type is required"))]
    pub device_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[validate(length(min = 4, max = 255, message = "Serial number too short"))]
    pub serial_number: String,
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeviceUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub device_type: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[validate(length(min = 4, max = 255, message = "Serial number too short"))]
    pub serial_number: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeviceResponse {
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

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            id: device.id,
            user_id: device.user_id,
            name: device.name,
            device_type: device.device_type,
            brand: device.brand,
            model: device.model,
            serial_number: device.serial_number,
            photo: device.photo,
            qr_data: device.qr_data,
            created_at: device.created_at,
            updated_at: device.updated_at,
        }
    }
}

/// QR image rendering is presentation; clients encode `qr_data` themselves.
#[derive(Debug, Serialize)]
pub struct DeviceQrResponse {
    pub device_id: String,
    pub qr_data: String,
}
