use axum::{http::StatusCode, response::IntoResponse, Json};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, Utc};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::auth::model::{PasswordResetToken, User};
use crate::modules::response::ErrorResponse;
use crate::services::authorization::Role;
use crate::services::{hashing, tokens};

/// Biometric signatures older or newer than this are rejected (replay guard).
const BIOMETRIC_TIMESTAMP_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // Uniform message: never disclose which part of the credential was wrong
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User account is inactive")]
    Inactive,

    #[error("Email or institutional id already registered")]
    AlreadyRegistered,

    #[error("Reset token not found")]
    ResetTokenNotFound,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Inactive => StatusCode::FORBIDDEN,
            Self::AlreadyRegistered => StatusCode::CONFLICT,
            Self::ResetTokenNotFound => StatusCode::NOT_FOUND,
            Self::InvalidResetToken => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Hashing(_) | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("auth error: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub struct UserCrud {
    pool: DbPool,
}

impl UserCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    // =========================================================================
    // Registration and credential verification
    // =========================================================================

    /// The pre-check is an early fail; the unique constraints on email and
    /// student_id are the actual safety mechanism, so a late race still
    /// surfaces as a Conflict.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        student_id: &str,
    ) -> Result<User, AuthError> {
        let taken: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE email = ? OR student_id = ?")
                .bind(email)
                .bind(student_id)
                .fetch_optional(&self.pool)
                .await?;
        if taken.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let password_hash =
            hashing::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            full_name: full_name.to_string(),
            student_id: student_id.to_string(),
            role: Role::Student,
            is_active: true,
            biometric_public_key: None,
            biometric_enabled: false,
            profile_photo: None,
            dark_mode: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, student_id, role, is_active,
                               biometric_public_key, biometric_enabled, profile_photo, dark_mode,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.student_id)
        .bind(user.role)
        .bind(user.is_active)
        .bind(&user.biometric_public_key)
        .bind(user.biometric_enabled)
        .bind(&user.profile_photo)
        .bind(user.dark_mode)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::AlreadyRegistered
            } else {
                AuthError::Database(e)
            }
        })?;

        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        Ok(user)
    }

    /// Verifies an ed25519 signature over `"{email}.{device_id}.{timestamp}"`
    /// against the user's enrolled public key. Disabled biometric, missing
    /// key, stale timestamp and bad signature all collapse into a uniform
    /// Unauthorized.
    pub async fn authenticate_biometric(
        &self,
        email: &str,
        device_id: &str,
        timestamp: i64,
        signature: &str,
    ) -> Result<User, AuthError> {
        if signature.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let now = Utc::now().timestamp();
        if (now - timestamp).abs() > BIOMETRIC_TIMESTAMP_TOLERANCE_SECS {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.biometric_enabled {
            return Err(AuthError::InvalidCredentials);
        }

        let public_key = user
            .biometric_public_key
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        let key_bytes: [u8; 32] = STANDARD
            .decode(public_key)
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or(AuthError::InvalidCredentials)?;
        let verifying_key =
            VerifyingKey::from_bytes(&key_bytes).map_err(|_| AuthError::InvalidCredentials)?;

        let sig_bytes = STANDARD
            .decode(signature)
            .map_err(|_| AuthError::InvalidCredentials)?;
        let signature =
            Signature::from_slice(&sig_bytes).map_err(|_| AuthError::InvalidCredentials)?;

        let message = format!("{}.{}.{}", email, device_id, timestamp);
        verifying_key
            .verify(message.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        Ok(user)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Issue a reset token for a known email. Returns None for unknown emails
    /// so the controller can answer uniformly either way. Prior unused tokens
    /// for the user are superseded.
    pub async fn request_password_reset(
        &self,
        email: &str,
        ttl_minutes: i64,
    ) -> Result<Option<(User, PasswordResetToken)>, AuthError> {
        let user = match self.find_by_email(email).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE user_id = ? AND used = 0")
            .bind(&user.id)
            .execute(&self.pool)
            .await?;

        let now = Utc::now();
        let token = PasswordResetToken {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            token: tokens::generate_opaque_token(),
            expires_at: now + Duration::minutes(ttl_minutes),
            used: false,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&token.id)
        .bind(&token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Some((user, token)))
    }

    /// Consume a reset token: must exist (404 otherwise), be unused and
    /// unexpired. Marks it used and replaces the password hash.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let reset: PasswordResetToken =
            sqlx::query_as("SELECT * FROM password_reset_tokens WHERE token = ?")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(AuthError::ResetTokenNotFound)?;

        if reset.used || reset.expires_at < Utc::now() {
            return Err(AuthError::InvalidResetToken);
        }

        let password_hash =
            hashing::hash_password(new_password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE password_reset_tokens SET used = 1 WHERE id = ?")
            .bind(&reset.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(&reset.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    pub async fn update_profile(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        profile_photo: Option<&str>,
        dark_mode: Option<bool>,
    ) -> Result<User, AuthError> {
        let mut user = self
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if let Some(name) = full_name {
            user.full_name = name.to_string();
        }
        if let Some(photo) = profile_photo {
            user.profile_photo = Some(photo.to_string());
        }
        if let Some(dark) = dark_mode {
            user.dark_mode = dark;
        }
        user.updated_at = Utc::now();

        sqlx::query(
            "UPDATE users SET full_name = ?, profile_photo = ?, dark_mode = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.full_name)
        .bind(&user.profile_photo)
        .bind(user.dark_mode)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let is_valid = hashing::verify_password(current_password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash =
            hashing::hash_password(new_password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Enroll or disable the biometric credential. The key must be a base64
    /// ed25519 public key (32 bytes).
    pub async fn set_biometric(
        &self,
        user_id: &str,
        public_key: Option<&str>,
        enabled: bool,
    ) -> Result<User, AuthError> {
        if let Some(key) = public_key {
            let bytes = STANDARD
                .decode(key)
                .map_err(|_| AuthError::Validation("Public key must be base64".to_string()))?;
            let key_bytes: [u8; 32] = bytes.try_into().map_err(|_| {
                AuthError::Validation("Public key must be 32 bytes".to_string())
            })?;
            VerifyingKey::from_bytes(&key_bytes).map_err(|_| {
                AuthError::Validation("Public key is not a valid ed25519 key".to_string())
            })?;
        }

        let mut user = self
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if enabled && public_key.is_none() && user.biometric_public_key.is_none() {
            return Err(AuthError::Validation(
                "Cannot enable biometric login without a public key".to_string(),
            ));
        }

        if let Some(key) = public_key {
            user.biometric_public_key = Some(key.to_string());
        }
        user.biometric_enabled = enabled;
        user.updated_at = Utc::now();

        sqlx::query(
            "UPDATE users SET biometric_public_key = ?, biometric_enabled = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.biometric_public_key)
        .bind(user.biometric_enabled)
        .bind(user.updated_at)
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }
}
