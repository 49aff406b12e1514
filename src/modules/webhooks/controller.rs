use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::modules::webhooks::{
    crud::{WebhookAdminError, WebhookCrud},
    schema::{
        LogsQuery, WebhookCreateRequest, WebhookLogResponse, WebhookResponse, WebhookUpdateRequest,
    },
};
use crate::services::authorization::has_permission;
use crate::services::identity::AuthUser;
use crate::AppState;

fn require_webhook_admin(auth: &AuthUser) -> Result<(), WebhookAdminError> {
    if has_permission(auth.role, "manage:webhooks") {
        Ok(())
    } else {
        Err(WebhookAdminError::AdminRequired)
    }
}

pub async fn create_webhook(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<WebhookCreateRequest>,
) -> Result<(StatusCode, Json<WebhookResponse>), WebhookAdminError> {
    require_webhook_admin(&auth)?;
    req.validate()
        .map_err(|e| WebhookAdminError::Validation(e.to_string()))?;

    let crud = WebhookCrud::new(state.db.clone());
    let webhook = crud
        .create(&req.name, &req.url, &req.events, req.secret.as_deref(), &auth.id)
        .await?;

    Ok((StatusCode::CREATED, Json(WebhookResponse::from(webhook))))
}

pub async fn list_webhooks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<WebhookResponse>>, WebhookAdminError> {
    require_webhook_admin(&auth)?;

    let crud = WebhookCrud::new(state.db.clone());
    let webhooks = crud.list().await?;

    Ok(Json(webhooks.into_iter().map(WebhookResponse::from).collect()))
}

pub async fn get_webhook(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(webhook_id): Path<String>,
) -> Result<Json<WebhookResponse>, WebhookAdminError> {
    require_webhook_admin(&auth)?;

    let crud = WebhookCrud::new(state.db.clone());
    let webhook = crud.get(&webhook_id).await?;

    Ok(Json(WebhookResponse::from(webhook)))
}

pub async fn update_webhook(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(webhook_id): Path<String>,
    Json(req): Json<WebhookUpdateRequest>,
) -> Result<Json<WebhookResponse>, WebhookAdminError> {
    require_webhook_admin(&auth)?;
    req.validate()
        .map_err(|e| WebhookAdminError::Validation(e.to_string()))?;

    let crud = WebhookCrud::new(state.db.clone());
    let webhook = crud
        .update(
            &webhook_id,
            req.name.as_deref(),
            req.url.as_deref(),
            req.events.as_deref(),
            req.is_active,
        )
        .await?;

    Ok(Json(WebhookResponse::from(webhook)))
}

pub async fn delete_webhook(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(webhook_id): Path<String>,
) -> Result<StatusCode, WebhookAdminError> {
    require_webhook_admin(&auth)?;

    let crud = WebhookCrud::new(state.db.clone());
    crud.delete(&webhook_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_webhook_logs(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(webhook_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<WebhookLogResponse>>, WebhookAdminError> {
    require_webhook_admin(&auth)?;

    let crud = WebhookCrud::new(state.db.clone());
    let logs = crud.logs(&webhook_id, query.limit).await?;

    Ok(Json(logs.into_iter().map(WebhookLogResponse::from).collect()))
}
