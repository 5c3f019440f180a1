//! Task matrix expansion
//!
//! Turns a suite into the ordered list of (prompt, provider, model) tasks.
//! Everything here is pure; no model is resolved or called.

use std::sync::Arc;

use crate::assertions::Assertion;
use crate::gateway::ProviderRegistry;
use crate::models::{ExecutionOptions, PromptSpec, Suite};

/// Model name used when a provider is not registered and has no default.
/// Resolving it fails, which turns the task into a failed result.
pub const UNRESOLVED_MODEL: &str = "default";

/// One unit of work
#[derive(Clone)]
pub struct Task {
    /// Position in the suite's task matrix
    pub index: usize,
    pub prompt: Arc<PromptSpec>,
    pub provider: String,
    pub model: String,
    /// Prompt assertions followed by suite-wide ones
    pub assertions: Arc<[Arc<dyn Assertion>]>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("index", &self.index)
            .field("prompt", &self.prompt.id)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("assertions", &self.assertions.len())
            .finish()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}/{}", self.prompt.name, self.provider, self.model)
    }
}

/// Prompt restriction, then options, then every registered provider.
/// An empty list at any level counts as unset.
pub fn resolve_providers(
    prompt: &PromptSpec,
    options: &ExecutionOptions,
    registry: &ProviderRegistry,
) -> Vec<String> {
    non_empty(prompt.providers.as_ref())
        .or_else(|| non_empty(options.providers.as_ref()))
        .cloned()
        .unwrap_or_else(|| registry.provider_names())
}

/// Options override, then prompt override, then the provider default
pub fn resolve_models(
    provider: &str,
    prompt: &PromptSpec,
    options: &ExecutionOptions,
    registry: &ProviderRegistry,
) -> Vec<String> {
    non_empty(options.models.get(provider))
        .or_else(|| non_empty(prompt.models.get(provider)))
        .cloned()
        .unwrap_or_else(|| {
            vec![registry
                .default_model(provider)
                .unwrap_or(UNRESOLVED_MODEL)
                .to_string()]
        })
}

fn non_empty(list: Option<&Vec<String>>) -> Option<&Vec<String>> {
    list.filter(|l| !l.is_empty())
}

/// Expand a suite into tasks: prompts in suite order, then providers, then models
pub fn expand_suite(
    suite: &Suite,
    options: &ExecutionOptions,
    registry: &ProviderRegistry,
) -> Vec<Task> {
    let mut tasks = Vec::new();

    for prompt in &suite.prompts {
        let assertions: Arc<[Arc<dyn Assertion>]> = prompt
            .assertions
            .iter()
            .chain(suite.global_assertions.iter())
            .cloned()
            .collect();
        let shared = Arc::new(prompt.clone());

        for provider in resolve_providers(prompt, options, registry) {
            for model in resolve_models(&provider, prompt, options, registry) {
                tasks.push(Task {
                    index: tasks.len(),
                    prompt: Arc::clone(&shared),
                    provider: provider.clone(),
                    model,
                    assertions: Arc::clone(&assertions),
                });
            }
        }
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::contains;
    use crate::gateway::{GatewayError, LanguageModel, ProviderEntry};
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

    fn keys(tasks: &[Task]) -> Vec<(String, String, String)> {
        tasks
            .iter()
            .map(|t| (t.prompt.id.clone(), t.provider.clone(), t.model.clone()))
            .collect()
    }

    fn key(p: &str, provider: &str, model: &str) -> (String, String, String) {
        (p.to_string(), provider.to_string(), model.to_string())
    }

    #[test]
    fn test_default_expansion_uses_all_providers_and_defaults() {
        let suite = Suite::new("S")
            .with_prompt(PromptSpec::new("a", "A", "prompt a"))
            .with_prompt(PromptSpec::new("b", "B", "prompt b"));

        let tasks = expand_suite(&suite, &ExecutionOptions::new(), &registry());
        assert_eq!(
            keys(&tasks),
            vec![
                key("a", "openai", "gpt-4.1-mini"),
                key("a", "google", "gemini-2.5-flash"),
                key("b", "openai", "gpt-4.1-mini"),
                key("b", "google", "gemini-2.5-flash"),
            ]
        );
        assert_eq!(
            tasks.iter().map(|t| t.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_prompt_providers_beat_options() {
        let prompt = PromptSpec::new("a", "A", "p").with_providers(["google"]);
        let options = ExecutionOptions::new().with_providers(["openai"]);
        assert_eq!(resolve_providers(&prompt, &options, &registry()), vec!["google"]);

        let plain = PromptSpec::new("b", "B", "p");
        assert_eq!(resolve_providers(&plain, &options, &registry()), vec!["openai"]);
    }

    #[test]
    fn test_option_models_beat_prompt_models() {
        let prompt = PromptSpec::new("a", "A", "p").with_models("google", ["gemini-2.5-pro"]);
        let registry = registry();

        assert_eq!(
            resolve_models("google", &prompt, &ExecutionOptions::new(), &registry),
            vec!["gemini-2.5-pro"]
        );

        let options =
            ExecutionOptions::new().with_models("google", ["gemini-2.5-flash", "gemini-2.5-pro"]);
        assert_eq!(
            resolve_models("google", &prompt, &options, &registry),
            vec!["gemini-2.5-flash", "gemini-2.5-pro"]
        );
    }

    #[test]
    fn test_empty_lists_fall_through() {
        let prompt = PromptSpec::new("a", "A", "p")
            .with_providers(Vec::<String>::new())
            .with_models("openai", Vec::<String>::new());
        let registry = registry();

        assert_eq!(
            resolve_providers(&prompt, &ExecutionOptions::new(), &registry),
            vec!["openai", "google"]
        );
        assert_eq!(
            resolve_models("openai", &prompt, &ExecutionOptions::new(), &registry),
            vec!["gpt-4.1-mini"]
        );
    }

    #[test]
    fn test_unknown_provider_still_yields_a_task() {
        let suite = Suite::new("S")
            .with_prompt(PromptSpec::new("a", "A", "p").with_providers(["anthropic"]));
        let tasks = expand_suite(&suite, &ExecutionOptions::new(), &registry());
        assert_eq!(keys(&tasks), vec![key("a", "anthropic", UNRESOLVED_MODEL)]);
    }

    #[test]
    fn test_global_assertions_are_appended() {
        let suite = Suite::new("S")
            .with_prompt(PromptSpec::new("a", "A", "p").assert(contains("x", false)))
            .with_global_assertion(Arc::new(contains("y", false)));

        let tasks = expand_suite(
            &suite,
            &ExecutionOptions::new().with_providers(["openai"]),
            &registry(),
        );
        assert_eq!(tasks.len(), 1);
        let labels: Vec<_> = tasks[0].assertions.iter().map(|a| a.describe()).collect();
        assert_eq!(labels, vec!["contains \"x\"", "contains \"y\""]);
    }

    #[test]
    fn test_empty_registry_and_no_override_gives_no_tasks() {
        let suite = Suite::new("S").with_prompt(PromptSpec::new("a", "A", "p"));
        let tasks = expand_suite(&suite, &ExecutionOptions::new(), &ProviderRegistry::new());
        assert!(tasks.is_empty());
    }
}
