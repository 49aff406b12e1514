use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use serde_json::json;

use campus_access::services::webhook::{verify_signature, WebhookDispatcher, WebhookEvent};

use crate::common::{test_email, test_student_id, TestContext};

/// (event header, signature header, raw body) per delivery received.
type Captured = Arc<Mutex<Vec<(String, String, String)>>>;

async fn spawn_receiver(status: StatusCode) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let store = captured.clone();

    let app = axum::Router::new().route(
        "/hook",
        axum::routing::post(move |headers: HeaderMap, body: String| {
            let store = store.clone();
            async move {
                let event = headers
                    .get("X-Webhook-Event")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let signature = headers
                    .get("X-Webhook-Signature")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                store.lock().unwrap().push((event, signature, body));
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/hook", addr), captured)
}

/// Receiver that sleeps before acknowledging; records the delivery only once
/// the response is about to go out.
async fn spawn_delayed_receiver(delay: Duration) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let store = captured.clone();

    let app = axum::Router::new().route(
        "/hook",
        axum::routing::post(move |headers: HeaderMap, body: String| {
            let store = store.clone();
            async move {
                tokio::time::sleep(delay).await;
                let event = headers
                    .get("X-Webhook-Event")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let signature = headers
                    .get("X-Webhook-Signature")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                store.lock().unwrap().push((event, signature, body));
                StatusCode::OK
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/hook", addr), captured)
}

async fn insert_webhook(
    ctx: &TestContext,
    url: &str,
    events: &[&str],
    failure_count: i64,
) -> (String, String) {
    let id = uuid::Uuid::new_v4().to_string();
    let secret = "test-webhook-secret".to_string();
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO webhooks \
         (id, name, url, secret, events, is_active, created_by, created_at, updated_at, failure_count) \
         VALUES (?, ?, ?, ?, ?, 1, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind("Test hook")
    .bind(url)
    .bind(&secret)
    .bind(serde_json::to_string(events).unwrap())
    .bind("test-admin")
    .bind(now)
    .bind(now)
    .bind(failure_count)
    .execute(&ctx.db)
    .await
    .unwrap();

    (id, secret)
}

async fn webhook_state(ctx: &TestContext, id: &str) -> (i64, bool) {
    sqlx::query_as::<_, (i64, bool)>("SELECT failure_count, is_active FROM webhooks WHERE id = ?")
        .bind(id)
        .fetch_one(&ctx.db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delivery_is_signed_and_logged() {
    let ctx = TestContext::new().await;
    let (url, captured) = spawn_receiver(StatusCode::OK).await;
    let (id, secret) = insert_webhook(&ctx, &url, &["access.recorded"], 0).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    dispatcher
        .trigger(WebhookEvent::AccessRecorded, json!({ "record_id": "r1" }))
        .await;

    let deliveries = captured.lock().unwrap().clone();
    assert_eq!(deliveries.len(), 1);
    let (event, signature, body) = &deliveries[0];
    assert_eq!(event, "access.recorded");
    assert!(verify_signature(&secret, body, signature).is_ok());

    let envelope: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(envelope["event"], "access.recorded");
    assert_eq!(envelope["data"]["record_id"], "r1");

    let (failure_count, is_active) = webhook_state(&ctx, &id).await;
    assert_eq!(failure_count, 0);
    assert!(is_active);

    let (success, status): (bool, Option<i64>) = sqlx::query_as(
        "SELECT success, response_status FROM webhook_logs WHERE webhook_id = ?",
    )
    .bind(&id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert!(success);
    assert_eq!(status, Some(200));
}

#[tokio::test]
async fn test_unsubscribed_events_are_not_delivered() {
    let ctx = TestContext::new().await;
    let (url, captured) = spawn_receiver(StatusCode::OK).await;
    let (id, _) = insert_webhook(&ctx, &url, &["device.created"], 0).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    dispatcher
        .trigger(WebhookEvent::AccessRecorded, json!({ "record_id": "r1" }))
        .await;

    assert!(captured.lock().unwrap().is_empty());

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM webhook_logs WHERE webhook_id = ?")
        .bind(&id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(logs, 0);
}

#[tokio::test]
async fn test_non_success_status_increments_failure_count() {
    let ctx = TestContext::new().await;
    let (url, _) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
    let (id, _) = insert_webhook(&ctx, &url, &["access.recorded"], 0).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    dispatcher
        .trigger(WebhookEvent::AccessRecorded, json!({}))
        .await;

    let (failure_count, is_active) = webhook_state(&ctx, &id).await;
    assert_eq!(failure_count, 1);
    assert!(is_active);

    let (success, status): (bool, Option<i64>) = sqlx::query_as(
        "SELECT success, response_status FROM webhook_logs WHERE webhook_id = ?",
    )
    .bind(&id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert!(!success);
    assert_eq!(status, Some(500));
}

#[tokio::test]
async fn test_unreachable_endpoint_deactivates_after_tenth_failure() {
    let ctx = TestContext::new().await;

    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/hook", listener.local_addr().unwrap());
    drop(listener);

    let (id, _) = insert_webhook(&ctx, &url, &["access.recorded"], 9).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    dispatcher
        .trigger(WebhookEvent::AccessRecorded, json!({}))
        .await;

    let (failure_count, is_active) = webhook_state(&ctx, &id).await;
    assert_eq!(failure_count, 10);
    assert!(!is_active);

    let error: Option<String> =
        sqlx::query_scalar("SELECT error_message FROM webhook_logs WHERE webhook_id = ?")
            .bind(&id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert!(error.is_some());
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let ctx = TestContext::new().await;
    let (url, _) = spawn_receiver(StatusCode::OK).await;
    let (id, _) = insert_webhook(&ctx, &url, &["access.recorded"], 5).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    dispatcher
        .trigger(WebhookEvent::AccessRecorded, json!({}))
        .await;

    let (failure_count, is_active) = webhook_state(&ctx, &id).await;
    assert_eq!(failure_count, 0);
    assert!(is_active);
}

#[tokio::test]
async fn test_slow_endpoint_does_not_delay_siblings() {
    let ctx = TestContext::new().await;
    let slow_delay = Duration::from_secs(2);
    let (slow_url, slow_captured) = spawn_delayed_receiver(slow_delay).await;
    let (fast_url, fast_captured) = spawn_receiver(StatusCode::OK).await;

    // Slow endpoint first: sequential dispatch would hold the fast one back
    insert_webhook(&ctx, &slow_url, &["access.recorded"], 0).await;
    insert_webhook(&ctx, &fast_url, &["access.recorded"], 0).await;

    let dispatcher = WebhookDispatcher::new(ctx.db.clone());
    let started = std::time::Instant::now();
    let handle = tokio::spawn(async move {
        dispatcher
            .trigger(WebhookEvent::AccessRecorded, json!({}))
            .await;
    });

    let mut fast_delivered = false;
    for _ in 0..50 {
        if !fast_captured.lock().unwrap().is_empty() {
            fast_delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // The healthy endpoint was hit while the slow one was still sleeping
    assert!(fast_delivered);
    assert!(started.elapsed() < slow_delay);
    assert!(slow_captured.lock().unwrap().is_empty());

    // The slow delivery still completes on its own
    handle.await.unwrap();
    assert_eq!(slow_captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_scan_delivers_access_entry_event() {
    let ctx = TestContext::new().await;
    let (url, captured) = spawn_receiver(StatusCode::OK).await;
    insert_webhook(&ctx, &url, &["access.entry"], 0).await;

    let (token, _) = ctx.register_user(&test_email(), &test_student_id()).await;
    let device = ctx.create_device(&token, "Laptop", "SN-HOOK-01").await;

    let response = ctx
        .server
        .post("/access/scan")
        .authorization_bearer(&token)
        .json(&json!({ "qr_data": device["qr_data"], "access_type": "entrada" }))
        .await;
    assert_eq!(response.status_code(), 201);

    // Delivery happens on a background task after the response is sent
    let mut deliveries = Vec::new();
    for _ in 0..50 {
        deliveries = captured.lock().unwrap().clone();
        if !deliveries.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert_eq!(deliveries.len(), 1);
    let (event, _, body) = &deliveries[0];
    assert_eq!(event, "access.entry");
    let envelope: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(envelope["data"]["access_type"], "entrada");
}
