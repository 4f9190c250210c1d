//! Webhook delivery

use std::sync::Arc;

use crate::formatter::WebhookPayload;
use crate::io::{redact_path, HttpClient};
use crate::NodewatchError;

/// Posts formatted payloads to the chat webhook
pub struct WebhookDispatcher {
    url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("url", &redact_path(&self.url))
            .finish()
    }
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    /// Deliver one payload, returning the destination's 2xx status code
    pub async fn send(&self, payload: &WebhookPayload) -> crate::Result<u16> {
        let body = serde_json::to_string(payload)?;

        let response = self
            .http
            .post_json(&self.url, &body)
            .await
            .map_err(|e| NodewatchError::Delivery {
                status: None,
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(NodewatchError::Delivery {
                status: Some(response.status),
                message: format!(
                    "webhook returned status {}: {}",
                    response.status, response.body
                ),
            });
        }

        tracing::debug!("Webhook accepted payload with status {}", response.status);
        Ok(response.status)
    }
}
