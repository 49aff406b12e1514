use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::modules::access::{
    crud::{AccessCrud, AccessError},
    model::AccessType,
    schema::{AccessRecordDetail, AccessRecordResponse, HistoryQuery, ScanRequest},
};
use crate::services::identity::AuthUser;
use crate::services::webhook::WebhookEvent;
use crate::AppState;

pub async fn scan_qr(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ScanRequest>,
) -> Result<(StatusCode, Json<AccessRecordResponse>), AccessError> {
    let crud = AccessCrud::new(state.db.clone());
    let record = crud
        .record_access(&req.qr_data, &req.access_type, req.location.as_deref(), &auth)
        .await?;

    // Event emission is a best-effort side channel after the write commits;
    // a notifier failure can never fail the scan.
    let payload = json!({
        "record_id": record.id,
        "device_id": record.device_id,
        "owner_id": record.user_id,
        "scanned_by": record.scanned_by,
        "access_type": record.access_type.as_str(),
        "timestamp": record.timestamp.to_rfc3339(),
        "location": record.location,
    });
    let direction_event = match record.access_type {
        AccessType::Entrada => WebhookEvent::AccessEntry,
        AccessType::Salida => WebhookEvent::AccessExit,
    };
    let webhooks = state.webhooks.clone();
    tokio::spawn(async move {
        webhooks
            .trigger(WebhookEvent::AccessRecorded, payload.clone())
            .await;
        webhooks.trigger(direction_event, payload).await;
    });

    Ok((StatusCode::CREATED, Json(AccessRecordResponse::from(record))))
}

pub async fn get_access_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AccessRecordDetail>>, AccessError> {
    let crud = AccessCrud::new(state.db.clone());
    let records = crud.history_for_user(&auth, query.limit).await?;

    Ok(Json(records))
}

pub async fn get_device_access_history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(device_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AccessRecordDetail>>, AccessError> {
    let crud = AccessCrud::new(state.db.clone());
    let records = crud
        .history_for_device(&device_id, &auth, query.limit)
        .await?;

    Ok(Json(records))
}
