use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::services::webhook::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Generate HMAC-SHA256 signature (hex) over the serialized envelope
pub fn generate_signature(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());

    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

/// Verify an inbound callback signature against the recomputed HMAC
pub fn verify_signature(secret: &str, payload: &str, signature: &str) -> Result<(), WebhookError> {
    let expected = generate_signature(secret, payload);

    // Constant-time comparison to prevent timing attacks
    if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
        return Err(WebhookError::InvalidSignature);
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
