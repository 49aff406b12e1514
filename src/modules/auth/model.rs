use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::services::authorization::Role;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub student_id: String,
    pub role: Role,
    pub is_active: bool,
    pub biometric_public_key: Option<String>,
    pub biometric_enabled: bool,
    pub profile_photo: Option<String>,
    pub dark_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// At most one active token per user: issuing a new one marks prior unused
/// tokens used.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
