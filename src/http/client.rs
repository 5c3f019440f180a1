//! HTTP client for provider APIs
//!
//! JSON-over-HTTP with provider credentials attached to every request.

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION},
    Client, StatusCode,
};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Transport ceiling; the engine's per-task timeout is normally much shorter.
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Connection refused to {0}")]
    ConnectionRefused(String),

    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

/// Client bound to one provider's base URL and credentials
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: String::new(),
            headers: HeaderMap::new(),
        })
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Attach a header to every request; values are marked sensitive
    pub fn default_header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::from_bytes(key.as_ref().as_bytes()).context("Invalid header name")?;
        let mut value = HeaderValue::from_str(value.as_ref()).context("Invalid header value")?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn bearer_auth(self, token: impl AsRef<str>) -> Result<Self> {
        self.default_header(AUTHORIZATION, format!("Bearer {}", token.as_ref()))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, HttpError> {
        let url = self.url(path);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    HttpError::Timeout(REQUEST_TIMEOUT_SECS)
                } else if e.is_connect() {
                    HttpError::ConnectionRefused(url.clone())
                } else {
                    HttpError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::InvalidBody(e.to_string()))?;
        debug!("POST {} -> {} in {}ms", url, status.as_u16(), start.elapsed().as_millis());

        if !status.is_success() {
            return Err(HttpError::Status {
                status,
                message: error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| HttpError::InvalidBody(e.to_string()))
    }
}

/// `error.message` from a provider error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
