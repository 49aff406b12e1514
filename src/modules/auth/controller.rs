use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, UserCrud},
    schema::{
        BiometricLoginRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
        RegisterRequest, ResetPasswordRequest, ResetPasswordResponse, TokenResponse, UserResponse,
    },
};
use crate::services::email;
use crate::services::identity::AuthUser;
use crate::services::webhook::WebhookEvent;
use crate::AppState;

fn token_response(
    state: &AppState,
    user: crate::modules::auth::model::User,
) -> Result<TokenResponse, AuthError> {
    let access_token = state.jwt_service.create_access_token(&user.id, user.role)?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: state.jwt_service.get_access_token_duration_secs(),
        user: UserResponse::from(user),
    })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .register(&req.email, &req.password, &req.full_name, &req.student_id)
        .await?;

    let payload = json!({
        "user_id": user.id,
        "email": user.email,
        "student_id": user.student_id,
    });
    let webhooks = state.webhooks.clone();
    tokio::spawn(async move {
        webhooks.trigger(WebhookEvent::UserRegistered, payload).await;
    });

    let body = token_response(&state, user)?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud.authenticate(&req.email, &req.password).await?;

    Ok(Json(token_response(&state, user)?))
}

pub async fn biometric_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BiometricLoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .authenticate_biometric(&req.email, &req.device_id, req.timestamp, &req.signature)
        .await?;

    Ok(Json(token_response(&state, user)?))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, AuthError> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .find_by_id(&auth.id)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(Json(UserResponse::from(user)))
}

/// Always answers the same way, whether or not the email exists.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AuthError> {
    let crud = UserCrud::new(state.db.clone());

    if let Some((user, reset)) = crud
        .request_password_reset(&req.email, state.reset_token_ttl_minutes)
        .await?
    {
        email::send_password_reset_email(&user.email, &reset.token, &user.full_name);
    }

    Ok(Json(ForgotPasswordResponse {
        message: "If the email is registered, a reset link has been sent",
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let crud = UserCrud::new(state.db.clone());
    crud.reset_password(&req.token, &req.new_password).await?;

    Ok(Json(ResetPasswordResponse {
        message: "Password has been reset",
    }))
}
