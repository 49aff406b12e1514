use std::str::FromStr;

use axum_test::TestServer;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub db: Pool<Sqlite>,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);

        // Single connection keeps the in-memory database alive for the whole test
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("Failed to open in-memory database");

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let jwt_service = campus_access::services::jwt::JwtService::new(
            "test-secret-key-for-testing-only".to_string(),
            60,
        );

        let app = campus_access::create_app(db.clone(), jwt_service, 60).await;
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db }
    }

    /// Register a user and return (access_token, user_id).
    pub async fn register_user(&self, email: &str, student_id: &str) -> (String, String) {
        let response = self
            .server
            .post("/auth/register")
            .json(&json!({
                "email": email,
                "password": test_password(),
                "full_name": "Test User",
                "student_id": student_id,
            }))
            .await;

        let body: serde_json::Value = response.json();
        let token = body["access_token"].as_str().unwrap().to_string();
        let user_id = body["user"]["id"].as_str().unwrap().to_string();
        (token, user_id)
    }

    /// Change a user's role directly. The role claim is embedded at token
    /// issuance, so callers must log in again to get a token with the new
    /// role.
    pub async fn set_role(&self, user_id: &str, role: &str) {
        sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role)
            .bind(user_id)
            .execute(&self.db)
            .await
            .unwrap();
    }

    pub async fn login(&self, email: &str) -> String {
        let response = self
            .server
            .post("/auth/login")
            .json(&json!({
                "email": email,
                "password": test_password(),
            }))
            .await;

        let body: serde_json::Value = response.json();
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_device(
        &self,
        token: &str,
        name: &str,
        serial: &str,
    ) -> serde_json::Value {
        let response = self
            .server
            .post("/devices")
            .authorization_bearer(token)
            .json(&json!({
                "name": name,
                "device_type": "laptop",
                "serial_number": serial,
            }))
            .await;

        response.json()
    }
}

// Helper to generate unique test email
#[allow(dead_code)]
pub fn test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4())
}

// Helper to generate unique institutional id
#[allow(dead_code)]
pub fn test_student_id() -> String {
    uuid::Uuid::new_v4().to_string()[..12].to_string()
}

#[allow(dead_code)]
pub fn test_password() -> &'static str {
    "TestPassword123!"
}
