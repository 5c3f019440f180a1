//! OpenAI chat completions provider

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{GatewayError, LanguageModel};
use crate::http::HttpClient;
use crate::models::Message;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// One OpenAI chat model
pub struct OpenAiModel {
    client: HttpClient,
    model: String,
}

impl OpenAiModel {
    /// `client` must already carry the base URL and bearer token
    pub fn new(client: HttpClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn request_body(&self, prompt: &str, context: &[Message]) -> Value {
        let mut messages: Vec<Value> = context
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();
        messages.push(json!({ "role": "user", "content": prompt }));

        json!({
            "model": self.model,
            "messages": messages,
        })
    }

    pub fn extract_text(body: &Value) -> Result<String, GatewayError> {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                GatewayError::MalformedResponse("OpenAI response missing content".to_string())
            })
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String, GatewayError> {
        let body = self.request_body(prompt, context);
        let response = self.client.post_json("/chat/completions", &body).await?;
        Self::extract_text(&response)
    }
}
