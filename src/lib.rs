pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::DbPool;
use modules::access::access_routes;
use modules::auth::auth_routes;
use modules::devices::device_routes;
use modules::users::user_routes;
use modules::webhooks::webhook_routes;
use services::jwt::JwtService;
use services::security::security_headers;
use services::webhook::WebhookDispatcher;

pub struct AppState {
    pub db: DbPool,
    pub jwt_service: JwtService,
    pub webhooks: Arc<WebhookDispatcher>,
    pub reset_token_ttl_minutes: i64,
}

pub async fn create_app(db: DbPool, jwt_service: JwtService, reset_token_ttl_minutes: i64) -> Router {
    let state = Arc::new(AppState {
        db: db.clone(),
        jwt_service,
        webhooks: Arc::new(WebhookDispatcher::new(db)),
        reset_token_ttl_minutes,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/devices", device_routes())
        .nest("/access", access_routes())
        .nest("/webhooks", webhook_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // device/profile photos are base64
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Campus Access Control API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
