//! Google Gemini provider

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{GatewayError, LanguageModel};
use crate::http::HttpClient;
use crate::models::{Message, Role};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One Gemini model
pub struct GoogleModel {
    client: HttpClient,
    model: String,
}

impl GoogleModel {
    /// `client` must already carry the base URL and API key header
    pub fn new(client: HttpClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// System turns go to `systemInstruction`; assistant turns use role `model`
    pub fn request_body(prompt: &str, context: &[Message]) -> Value {
        let system: Vec<Value> = context
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| json!({ "text": m.content }))
            .collect();

        let mut contents: Vec<Value> = context
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();
        contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));

        let mut body = json!({ "contents": contents });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": system });
        }
        body
    }

    pub fn extract_text(body: &Value) -> Result<String, GatewayError> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                GatewayError::MalformedResponse("Gemini response missing candidates".to_string())
            })?;

        Ok(parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect())
    }
}

#[async_trait]
impl LanguageModel for GoogleModel {
    async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String, GatewayError> {
        let body = Self::request_body(prompt, context);
        let path = format!("/models/{}:generateContent", self.model);
        let response = self.client.post_json(&path, &body).await?;
        Self::extract_text(&response)
    }
}
