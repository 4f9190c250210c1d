//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstraction over HTTP client for dependency injection
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request with the given query parameters.
    ///
    /// Query values may hold credentials, so implementations must not log them.
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> crate::Result<HttpResponse>;

    /// Send a POST request with a JSON body
    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::NodewatchError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> crate::Result<HttpResponse> {
        tracing::debug!("GET {} ({} query params)", url, query.len());
        let response = self
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                crate::NodewatchError::Http(format!("GET {} failed: {}", url, e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                crate::NodewatchError::Http(format!("Reading response body: {}", e.without_url()))
            })?;

        tracing::debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }

    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {} ({} bytes)", redact_path(url), body.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| {
                crate::NodewatchError::Http(format!(
                    "POST {} failed: {}",
                    redact_path(url),
                    e.without_url()
                ))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                crate::NodewatchError::Http(format!("Reading response body: {}", e.without_url()))
            })?;

        tracing::debug!(
            "POST {} -> {} ({} bytes)",
            redact_path(url),
            status,
            body.len()
        );
        Ok(HttpResponse { status, body })
    }
}

/// Webhook URLs embed their token in the path; keep only scheme and host for logs
pub fn redact_path(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}/...", parsed.scheme(), host),
            None => "<webhook>".to_string(),
        },
        Err(_) => "<webhook>".to_string(),
    }
}
