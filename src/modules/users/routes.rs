use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(controller::get_profile).put(controller::update_profile))
        .route("/me/password", put(controller::change_password))
        .route("/me/biometric", put(controller::update_biometric))
}
