use reqwest::Client;
use std::time::Duration;

use crate::services::webhook::generate_signature;

/// Per-delivery cap; a dead endpoint must not hold a worker longer than this.
const DELIVERY_TIMEOUT_SECS: u64 = 10;

const MAX_RESPONSE_BODY_CHARS: usize = 1000;
const MAX_ERROR_CHARS: usize = 500;

/// Webhook delivery client
pub struct WebhookDeliveryClient {
    client: Client,
}

impl WebhookDeliveryClient {
    pub fn new() -> Self {
        // Falling back to an untimed client would drop the delivery bound
        let client = Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECS))
            .build()
            .expect("failed to construct webhook HTTP client");

        Self { client }
    }

    /// POST the serialized envelope to one endpoint. Transport errors come
    /// back as a failed DeliveryResult, never as Err.
    pub async fn deliver(
        &self,
        url: &str,
        secret: &str,
        event: &str,
        payload_json: &str,
    ) -> DeliveryResult {
        let signature = generate_signature(secret, payload_json);

        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("X-Webhook-Signature", &signature)
            .header("X-Webhook-Event", event)
            .header("User-Agent", "CampusAccess-Webhooks/1.0")
            .body(payload_json.to_string());

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                let message = if e.is_timeout() {
                    "Request timeout".to_string()
                } else {
                    e.to_string()
                };
                return DeliveryResult {
                    response_status: None,
                    response_body: None,
                    error_message: Some(truncate(&message, MAX_ERROR_CHARS)),
                };
            }
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .ok()
            .map(|b| truncate(&b, MAX_RESPONSE_BODY_CHARS));

        let error_message = if (200..300).contains(&status) {
            None
        } else {
            Some(format!("HTTP {}", status))
        };

        DeliveryResult {
            response_status: Some(status as i64),
            response_body: body,
            error_message,
        }
    }
}

impl Default for WebhookDeliveryClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one webhook delivery attempt
#[derive(Debug, Clone)]
pub struct DeliveryResult {
    pub response_status: Option<i64>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
}

impl DeliveryResult {
    pub fn is_success(&self) -> bool {
        matches!(self.response_status, Some(s) if (200..300).contains(&s))
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
