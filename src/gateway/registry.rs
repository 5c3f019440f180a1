//! Provider registry
//!
//! Immutable table of providers and their model handles, built once and
//! handed to the engine.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::{GatewayError, GoogleModel, LanguageModel, OpenAiModel};
use crate::config::AppConfig;
use crate::http::HttpClient;

/// One provider and its models
#[derive(Clone)]
pub struct ProviderEntry {
    pub name: String,
    pub display_name: String,
    pub default_model: String,
    models: Vec<(String, Arc<dyn LanguageModel>)>,
}

impl ProviderEntry {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            default_model: default_model.into(),
            models: Vec::new(),
        }
    }

    /// Register a model handle, replacing one with the same name
    pub fn with_model(mut self, name: impl Into<String>, model: Arc<dyn LanguageModel>) -> Self {
        let name = name.into();
        self.models.retain(|(existing, _)| *existing != name);
        self.models.push((name, model));
        self
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(name, _)| name.as_str())
    }

    fn model(&self, name: &str) -> Option<&Arc<dyn LanguageModel>> {
        self.models
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, model)| model)
    }
}

impl fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("name", &self.name)
            .field("default_model", &self.default_model)
            .field("models", &self.model_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Ordered, immutable set of providers
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider, replacing one with the same name in place
    pub fn with_provider(mut self, entry: ProviderEntry) -> Self {
        match self.providers.iter_mut().find(|p| p.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.providers.push(entry),
        }
        self
    }

    /// Register every provider that has credentials configured
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new();

        if let Some(api_key) = config.openai.api_key.as_deref().filter(|k| !k.is_empty()) {
            let client = HttpClient::new()?
                .base_url(config.openai_base_url())
                .bearer_auth(api_key)?;
            let mut entry = ProviderEntry::new("openai", "OpenAI", "gpt-4.1-mini");
            for model in ["gpt-4.1-mini"] {
                entry = entry.with_model(model, Arc::new(OpenAiModel::new(client.clone(), model)));
            }
            registry = registry.with_provider(entry);
        }

        if let Some(api_key) = config.google.api_key.as_deref().filter(|k| !k.is_empty()) {
            let client = HttpClient::new()?
                .base_url(config.google_base_url())
                .default_header("x-goog-api-key", api_key)?;
            let mut entry = ProviderEntry::new("google", "Google", "gemini-2.5-flash");
            for model in ["gemini-2.5-flash", "gemini-2.5-pro"] {
                entry = entry.with_model(model, Arc::new(GoogleModel::new(client.clone(), model)));
            }
            registry = registry.with_provider(entry);
        }

        info!(
            "Registered providers: {}",
            registry.provider_names().join(", ")
        );
        Ok(registry)
    }

    /// Look up a callable model
    pub fn resolve(&self, provider: &str, model: &str) -> Result<Arc<dyn LanguageModel>, GatewayError> {
        let entry = self
            .provider(provider)
            .ok_or_else(|| GatewayError::UnknownProvider(provider.to_string()))?;

        debug!("Resolving {}/{}", provider, model);
        entry
            .model(model)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownModel {
                provider: provider.to_string(),
                model: model.to_string(),
            })
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderEntry> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    /// Names in registration order
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name.clone()).collect()
    }

    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.provider(provider).map(|p| p.default_model.as_str())
    }

    pub fn contains(&self, provider: &str) -> bool {
        self.provider(provider).is_some()
    }

    /// Every (provider, model) pair
    pub fn models(&self) -> Vec<(String, String)> {
        self.providers
            .iter()
            .flat_map(|p| {
                p.model_names()
                    .map(move |m| (p.name.clone(), m.to_string()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl LanguageModel for Echo {
        async fn generate(&self, prompt: &str, _context: &[Message]) -> Result<String, GatewayError> {
            Ok(prompt.to_string())
        }
    }

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider(
                ProviderEntry::new("openai", "OpenAI", "gpt-4.1-mini")
                    .with_model("gpt-4.1-mini", Arc::new(Echo)),
            )
            .with_provider(
                ProviderEntry::new("google", "Google", "gemini-2.5-flash")
                    .with_model("gemini-2.5-flash", Arc::new(Echo))
                    .with_model("gemini-2.5-pro", Arc::new(Echo)),
            )
    }

    #[test]
    fn test_resolve_known_model() {
        let model = registry().resolve("google", "gemini-2.5-pro").unwrap();
        let reply = tokio_test::block_on(model.generate("ping", &[]));
        assert_eq!(reply.unwrap(), "ping");
    }

    #[test]
    fn test_resolve_errors() {
        let registry = registry();
        assert_eq!(
            registry.resolve("anthropic", "x").err(),
            Some(GatewayError::UnknownProvider("anthropic".to_string()))
        );
        let err = registry.resolve("openai", "gpt-5").err().unwrap();
        assert!(err.is_resolution());
        assert_eq!(err.to_string(), "Model gpt-5 not found in provider openai");
    }

    #[test]
    fn test_registry_listing() {
        let registry = registry();
        assert_eq!(registry.provider_names(), vec!["openai", "google"]);
        assert_eq!(registry.default_model("google"), Some("gemini-2.5-flash"));
        assert_eq!(registry.default_model("missing"), None);
        assert_eq!(registry.models().len(), 3);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_with_provider_replaces_in_place() {
        let registry = registry().with_provider(ProviderEntry::new("openai", "OpenAI", "other"));
        assert_eq!(registry.provider_names(), vec!["openai", "google"]);
        assert_eq!(registry.default_model("openai"), Some("other"));
    }

    #[test]
    fn test_from_config_skips_providers_without_keys() {
        let mut config = AppConfig::default();
        config.google.api_key = Some("test-key".to_string());

        let registry = tokio_test::assert_ok!(ProviderRegistry::from_config(&config));
        assert_eq!(registry.provider_names(), vec!["google"]);
        tokio_test::assert_ok!(registry.resolve("google", "gemini-2.5-pro"));
        assert!(registry.resolve("openai", "gpt-4.1-mini").is_err());
        assert!(!registry.contains("openai"));
    }
}
