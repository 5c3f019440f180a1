//! Suite definition files
//!
//! YAML or JSON documents describing suites declaratively. Assertions are
//! compiled when the file is built, so a bad pattern fails before any task runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::assertions::{AssertionSpec, Judge};
use crate::config::is_yaml_file;
use crate::models::{Message, PromptSpec, Suite, SuiteConfig};

/// Top-level suite file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteFile {
    pub suites: Vec<SuiteDefinition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: SuiteConfig,
    #[serde(default)]
    pub global_assertions: Vec<AssertionSpec>,
    pub prompts: Vec<PromptDefinition>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub context: Vec<Message>,
    #[serde(default)]
    pub providers: Option<Vec<String>>,
    #[serde(default)]
    pub models: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub assertions: Vec<AssertionSpec>,
}

impl SuiteFile {
    /// Parse a suite file; YAML by extension, JSON otherwise
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite file: {}", path.display()))?;

        let file: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML suite file: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON suite file: {}", path.display()))?
        };

        debug!("Loaded {} suite(s) from {}", file.suites.len(), path.display());
        Ok(file)
    }

    /// Whether any assertion needs a judge model
    pub fn needs_judge(&self) -> bool {
        self.suites.iter().any(|s| {
            s.global_assertions.iter().any(AssertionSpec::is_judged)
                || s
                    .prompts
                    .iter()
                    .any(|p| p.assertions.iter().any(AssertionSpec::is_judged))
        })
    }

    /// Compile every suite
    pub fn build(&self, judge: Option<&Arc<Judge>>) -> Result<Vec<Suite>> {
        self.suites.iter().map(|s| s.build(judge)).collect()
    }
}

impl SuiteDefinition {
    pub fn build(&self, judge: Option<&Arc<Judge>>) -> Result<Suite> {
        let mut suite = Suite::new(&self.name);
        suite.description = self.description.clone();
        suite.config = self.config.clone();

        for (i, spec) in self.global_assertions.iter().enumerate() {
            let assertion = spec.build(judge).with_context(|| {
                format!("Suite '{}': global assertion #{}", self.name, i + 1)
            })?;
            suite = suite.with_global_assertion(assertion);
        }

        for prompt in &self.prompts {
            suite = suite.with_prompt(
                prompt
                    .build(judge)
                    .with_context(|| format!("Suite '{}'", self.name))?,
            );
        }

        Ok(suite)
    }
}

impl PromptDefinition {
    pub fn build(&self, judge: Option<&Arc<Judge>>) -> Result<PromptSpec> {
        let mut prompt = PromptSpec::new(&self.id, &self.name, &self.prompt);
        prompt.description = self.description.clone();
        prompt.context = self.context.clone();
        prompt.providers = self.providers.clone();
        prompt.models = self.models.clone();

        for (i, spec) in self.assertions.iter().enumerate() {
            let assertion = spec
                .build(judge)
                .with_context(|| format!("Prompt '{}': assertion #{}", self.id, i + 1))?;
            prompt = prompt.assert_shared(assertion);
        }

        Ok(prompt)
    }
}
