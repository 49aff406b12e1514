use crate::common::{test_email, test_student_id, TestContext};
use serde_json::json;

async fn admin_token(ctx: &TestContext) -> String {
    let email = test_email();
    let (_, user_id) = ctx.register_user(&email, &test_student_id()).await;
    ctx.set_role(&user_id, "admin").await;
    ctx.login(&email).await
}

#[tokio::test]
async fn test_create_webhook_requires_admin() {
    let ctx = TestContext::new().await;
    let (student_token, _) = ctx.register_user(&test_email(), &test_student_id()).await;

    let response = ctx
        .server
        .post("/webhooks")
        .authorization_bearer(&student_token)
        .json(&json!({
            "name": "Audit feed",
            "url": "https://example.com/hook",
            "events": ["access.recorded"],
        }))
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_security_role_cannot_manage_webhooks() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let (_, user_id) = ctx.register_user(&email, &test_student_id()).await;
    ctx.set_role(&user_id, "security").await;
    let token = ctx.login(&email).await;

    let response = ctx
        .server
        .get("/webhooks")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_admin_webhook_lifecycle() {
    let ctx = TestContext::new().await;
    let token = admin_token(&ctx).await;

    // Create
    let response = ctx
        .server
        .post("/webhooks")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Audit feed",
            "url": "https://example.com/hook",
            "events": ["access.recorded", "device.created"],
            "secret": "super-secret-value",
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let webhook: serde_json::Value = response.json();
    let webhook_id = webhook["id"].as_str().unwrap().to_string();
    assert_eq!(webhook["secret"], "super-secret-value");
    assert_eq!(webhook["is_active"], true);
    assert_eq!(webhook["failure_count"], 0);

    // List
    let response = ctx
        .server
        .get("/webhooks")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);
    let list: serde_json::Value = response.json();
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Update
    let response = ctx
        .server
        .put(&format!("/webhooks/{}", webhook_id))
        .authorization_bearer(&token)
        .json(&json!({ "name": "Renamed feed", "events": ["access.entry"] }))
        .await;
    assert_eq!(response.status_code(), 200);
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["name"], "Renamed feed");
    assert_eq!(updated["events"], json!(["access.entry"]));

    // Delete
    let response = ctx
        .server
        .delete(&format!("/webhooks/{}", webhook_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 204);

    let response = ctx
        .server
        .get(&format!("/webhooks/{}", webhook_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_unknown_event_rejected() {
    let ctx = TestContext::new().await;
    let token = admin_token(&ctx).await;

    let response = ctx
        .server
        .post("/webhooks")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Bad feed",
            "url": "https://example.com/hook",
            "events": ["user.deleted"],
        }))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_secret_generated_when_omitted() {
    let ctx = TestContext::new().await;
    let token = admin_token(&ctx).await;

    let response = ctx
        .server
        .post("/webhooks")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Audit feed",
            "url": "https://example.com/hook",
            "events": ["access.recorded"],
        }))
        .await;

    assert_eq!(response.status_code(), 201);
    let webhook: serde_json::Value = response.json();
    assert_eq!(webhook["secret"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn test_reactivation_resets_failure_count() {
    let ctx = TestContext::new().await;
    let token = admin_token(&ctx).await;

    let response = ctx
        .server
        .post("/webhooks")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Flaky feed",
            "url": "https://example.com/hook",
            "events": ["access.recorded"],
        }))
        .await;
    let webhook: serde_json::Value = response.json();
    let webhook_id = webhook["id"].as_str().unwrap().to_string();

    // Simulate the dispatcher having disabled it after repeated failures
    sqlx::query("UPDATE webhooks SET is_active = 0, failure_count = 10 WHERE id = ?")
        .bind(&webhook_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .put(&format!("/webhooks/{}", webhook_id))
        .authorization_bearer(&token)
        .json(&json!({ "is_active": true }))
        .await;

    assert_eq!(response.status_code(), 200);
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["is_active"], true);
    assert_eq!(updated["failure_count"], 0);
}

#[tokio::test]
async fn test_logs_for_unknown_webhook_not_found() {
    let ctx = TestContext::new().await;
    let token = admin_token(&ctx).await;

    let response = ctx
        .server
        .get(&format!("/webhooks/{}/logs", uuid::Uuid::new_v4()))
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), 404);
}
