use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 3, message = "Full name must be at least 3 characters"))]
    pub full_name: Option<String>,
    pub profile_photo: Option<String>,
    pub dark_mode: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub message: &'static str,
}

/// `public_key` is a base64-encoded 32-byte ed25519 verifying key. Omitting
/// it keeps a previously enrolled key.
#[derive(Debug, Deserialize)]
pub struct BiometricUpdateRequest {
    pub public_key: Option<String>,
    pub enabled: bool,
}
