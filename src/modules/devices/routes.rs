use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn device_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(controller::create_device).get(controller::list_devices))
        .route(
            "/{device_id}",
            get(controller::get_device)
                .put(controller::update_device)
                .delete(controller::delete_device),
        )
        .route("/{device_id}/qr", get(controller::get_device_qr))
}
