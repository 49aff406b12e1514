use std::env;

/// Password-reset mail is fire-and-forget: failures are logged, never
/// surfaced to the caller (account enumeration).
///
/// SMTP delivery is an external collaborator; this service only builds the
/// reset link and logs it, which is also the behavior when no relay is
/// configured in production.
pub fn send_password_reset_email(to_email: &str, reset_token: &str, full_name: &str) {
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
    let reset_link = format!("{}/reset-password?token={}", frontend_url, reset_token);

    tracing::info!(
        email = %to_email,
        "password reset link for {}: {}",
        full_name,
        reset_link
    );
}
