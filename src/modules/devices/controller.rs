use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::modules::devices::{
    crud::{DeviceCrud, DeviceError},
    model::Device,
    schema::{DeviceCreateRequest, DeviceQrResponse, DeviceResponse, DeviceUpdateRequest},
};
use crate::services::identity::AuthUser;
use crate::services::webhook::WebhookEvent;
use crate::AppState;

fn notify(state: &Arc<AppState>, event: WebhookEvent, device: &Device) {
    let payload = json!({
        "device_id": device.id,
        "owner_id": device.user_id,
        "name": device.name,
        "device_type": device.device_type,
        "serial_number": device.serial_number,
    });
    let webhooks = state.webhooks.clone();
    tokio::spawn(async move {
        webhooks.trigger(event, payload).await;
    });
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<DeviceCreateRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), DeviceError> {
    req.validate()
        .map_err(|e| DeviceError::Validation(e.to_string()))?;

    let crud = DeviceCrud::new(state.db.clone());
    let device = crud
        .create(
            &auth.id,
            &req.name,
            &req.device_type,
            req.brand.as_deref(),
            req.model.as_deref(),
            &req.serial_number,
            req.photo.as_deref(),
        )
        .await?;

    notify(&state, WebhookEvent::DeviceCreated, &device);

    Ok((StatusCode::CREATED, Json(DeviceResponse::from(device))))
}

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<DeviceResponse>>, DeviceError> {
    let crud = DeviceCrud::new(state.db.clone());
    let devices = crud.list_for_owner(&auth.id).await?;

    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

pub async fn get_device(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceResponse>, DeviceError> {
    let crud = DeviceCrud::new(state.db.clone());
    let device = crud.get(&device_id).await?;

    if device.user_id != auth.id {
        return Err(DeviceError::NotOwner("view"));
    }

    Ok(Json(DeviceResponse::from(device)))
}

pub async fn get_device_qr(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceQrResponse>, DeviceError> {
    let crud = DeviceCrud::new(state.db.clone());
    let device = crud.get(&device_id).await?;

    if device.user_id != auth.id {
        return Err(DeviceError::NotOwner("view"));
    }

    Ok(Json(DeviceQrResponse {
        device_id: device.id,
        qr_data: device.qr_data,
    }))
}

pub async fn update_device(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(device_id): Path<String>,
    Json(req): Json<DeviceUpdateRequest>,
) -> Result<Json<DeviceResponse>, DeviceError> {
    req.validate()
        .map_err(|e| DeviceError::Validation(e.to_string()))?;

    let crud = DeviceCrud::new(state.db.clone());
    let device = crud
        .update(
            &device_id,
            &auth.id,
            req.name.as_deref(),
            req.device_type.as_deref(),
            req.brand.as_deref(),
            req.model.as_deref(),
            req.serial_number.as_deref(),
            req.photo.as_deref(),
        )
        .await?;

    notify(&state, WebhookEvent::DeviceUpdated, &device);

    Ok(Json(DeviceResponse::from(device)))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(device_id): Path<String>,
) -> Result<StatusCode, DeviceError> {
    let crud = DeviceCrud::new(state.db.clone());
    let device = crud.delete(&device_id, &auth.id).await?;

    notify(&state, WebhookEvent::DeviceDeleted, &device);

    Ok(StatusCode::NO_CONTENT)
}
