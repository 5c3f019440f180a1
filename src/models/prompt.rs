//! Prompt and suite definitions
//!
//! Static test data consumed by the execution engine. Nothing in here is
//! mutated once a run starts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::assertions::Assertion;

/// Default per-task timeout when neither options nor suite set one
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Speaker of a conversation turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prior conversation turn sent ahead of the prompt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A single prompt test case
#[derive(Clone)]
pub struct PromptSpec {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    /// Prior turns, in conversation order
    pub context: Vec<Message>,
    /// Restricts the prompt to these providers
    pub providers: Option<Vec<String>>,
    /// Per-provider model names
    pub models: HashMap<String, Vec<String>>,
    pub assertions: Vec<Arc<dyn Assertion>>,
}

impl PromptSpec {
    pub fn new(id: impl Into<String>, name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            prompt: prompt.into(),
            context: Vec::new(),
            providers: None,
            models: HashMap::new(),
            assertions: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a prior conversation turn
    pub fn with_message(mut self, message: Message) -> Self {
        self.context.push(message);
        self
    }

    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_models<I, S>(mut self, provider: impl Into<String>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models
            .insert(provider.into(), models.into_iter().map(Into::into).collect());
        self
    }

    pub fn assert(mut self, assertion: impl Assertion + 'static) -> Self {
        self.assertions.push(Arc::new(assertion));
        self
    }

    pub fn assert_shared(mut self, assertion: Arc<dyn Assertion>) -> Self {
        self.assertions.push(assertion);
        self
    }
}

impl fmt::Debug for PromptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("prompt", &self.prompt)
            .field("context", &self.context)
            .field("providers", &self.providers)
            .field("models", &self.models)
            .field(
                "assertions",
                &self
                    .assertions
                    .iter()
                    .map(|a| a.describe())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Suite-level defaults
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    #[serde(default, alias = "timeout")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub parallel: Option<bool>,
}

/// A named, ordered group of prompts tested together
#[derive(Clone)]
pub struct Suite {
    pub name: String,
    pub description: Option<String>,
    pub prompts: Vec<PromptSpec>,
    /// Appended to every prompt's own assertions
    pub global_assertions: Vec<Arc<dyn Assertion>>,
    pub config: SuiteConfig,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("prompts", &self.prompts)
            .field(
                "global_assertions",
                &self
                    .global_assertions
                    .iter()
                    .map(|a| a.describe())
                    .collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            prompts: Vec::new(),
            global_assertions: Vec::new(),
            config: SuiteConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prompt(mut self, prompt: PromptSpec) -> Self {
        self.prompts.push(prompt);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = Some(parallel);
        self
    }

    pub fn with_global_assertion(mut self, assertion: Arc<dyn Assertion>) -> Self {
        self.global_assertions.push(assertion);
        self
    }
}

/// Caller-supplied execution options; every field falls back to a default
#[derive(Clone, Debug, Default)]
pub struct ExecutionOptions {
    pub providers: Option<Vec<String>>,
    /// Overrides prompt-level model lists per provider
    pub models: HashMap<String, Vec<String>>,
    pub timeout_ms: Option<u64>,
    pub parallel: Option<bool>,
    /// Caps in-flight tasks per suite; `None` issues every task at once
    pub max_concurrency: Option<usize>,
    pub verbose: bool,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_models<I, S>(mut self, provider: impl Into<String>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models
            .insert(provider.into(), models.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Options, then suite, then the global default
    pub fn effective_timeout_ms(&self, suite: &SuiteConfig) -> u64 {
        self.timeout_ms
            .or(suite.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    /// Options, then suite, then sequential
    pub fn effective_parallel(&self, suite: &SuiteConfig) -> bool {
        self.parallel.or(suite.parallel).unwrap_or(false)
    }
}
