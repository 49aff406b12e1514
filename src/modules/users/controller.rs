use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, UserCrud},
    schema::UserResponse,
};
use crate::modules::users::schema::{
    BiometricUpdateRequest, ChangePasswordRequest, ChangePasswordResponse, ProfileUpdateRequest,
};
use crate::services::identity::AuthUser;
use crate::AppState;

pub async fn get_profile(
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

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .update_profile(
            &auth.id,
            req.full_name.as_deref(),
            req.profile_photo.as_deref(),
            req.dark_mode,
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AuthError> {
    req.validate()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    let crud = UserCrud::new(state.db.clone());
    crud.change_password(&auth.id, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(ChangePasswordResponse {
        message: "Password updated",
    }))
}

pub async fn update_biometric(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<BiometricUpdateRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .set_biometric(&auth.id, req.public_key.as_deref(), req.enabled)
        .await?;

    Ok(Json(UserResponse::from(user)))
}
