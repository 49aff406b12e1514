use crate::common::{test_email, test_password, test_student_id, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_login_success() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email, &test_student_id()).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": test_password(),
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert!(body["access_token"].as_str().unwrap().len() > 20);
    assert_eq!(body["user"]["email"], email);
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let ctx = TestContext::new().await;
    let email = test_email();
    ctx.register_user(&email, &test_student_id()).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": "WrongPassword123!",
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": test_email(),
            "password": test_password(),
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_login_inactive_user_forbidden() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let (_, user_id) = ctx.register_user(&email, &test_student_id()).await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(&user_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": email,
            "password": test_password(),
        }))
        .await;

    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_me_returns_profile() {
    let ctx = TestContext::new().await;
    let email = test_email();
    let (token, user_id) = ctx.register_user(&email, &test_student_id()).await;

    let response = ctx
        .server
        .get("/auth/me")
        .authorization_bearer(&token)
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], user_id);
    assert_eq!(body["email"], email);
}

#[tokio::test]
async fn test_me_without_token_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/auth/me").await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_me_with_garbage_token_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .get("/auth/me")
        .authorization_bearer("not.a.token")
        .await;

    assert_eq!(response.status_code(), 401);
}
