use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn access_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scan", post(controller::scan_qr))
        .route("/history", get(controller::get_access_history))
        .route(
            "/device/{device_id}/history",
            get(controller::get_device_access_history),
        )
}
