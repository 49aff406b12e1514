use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn webhook_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(controller::create_webhook).get(controller::list_webhooks))
        .route(
            "/{webhook_id}",
            get(controller::get_webhook)
                .put(controller::update_webhook)
                .delete(controller::delete_webhook),
        )
        .route("/{webhook_id}/logs", get(controller::get_webhook_logs))
}
