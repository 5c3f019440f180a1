//! Model gateway
//!
//! Turns a (provider, model) pair into a callable language model. The engine
//! only depends on [`LanguageModel`] and [`ProviderRegistry`].

#![allow(dead_code)]

mod google;
mod openai;
mod registry;

pub use google::{GoogleModel, GOOGLE_BASE_URL};
pub use openai::{OpenAiModel, OPENAI_BASE_URL};
pub use registry::{ProviderEntry, ProviderRegistry};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::http::HttpError;
use crate::models::Message;

/// Gateway resolution and invocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Provider {0} not found")]
    UnknownProvider(String),

    #[error("Model {model} not found in provider {provider}")]
    UnknownModel { provider: String, model: String },

    #[error("Model call timed out after {0}ms")]
    Timeout(u64),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Timeout(_))
    }

    /// Unknown provider or model
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            GatewayError::UnknownProvider(_) | GatewayError::UnknownModel { .. }
        )
    }
}

impl From<HttpError> for GatewayError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Timeout(secs) => GatewayError::Timeout(secs * 1000),
            HttpError::InvalidBody(msg) => GatewayError::MalformedResponse(msg),
            other => GatewayError::Provider(other.to_string()),
        }
    }
}

/// Generates text from a prompt and optional prior turns
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String, GatewayError>;
}

/// Invoke a model, giving up after `timeout`
pub async fn generate_with_timeout(
    model: &dyn LanguageModel,
    prompt: &str,
    context: &[Message],
    timeout: Duration,
) -> Result<String, GatewayError> {
    match tokio::time::timeout(timeout, model.generate(prompt, context)).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(timeout.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sleepy(u64);

    #[async_trait]
    impl LanguageModel for Sleepy {
        async fn generate(&self, prompt: &str, _context: &[Message]) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_millis(self.0)).await;
            Ok(prompt.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_generate_within_timeout() {
        let text = generate_with_timeout(&Sleepy(1), "hi", &[], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(text, "HI");
    }

    #[tokio::test]
    async fn test_generate_times_out() {
        let err = generate_with_timeout(&Sleepy(500), "hi", &[], Duration::from_millis(10))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Timeout(10));
        assert!(err.is_timeout());
        assert!(!err.is_resolution());
    }
}
