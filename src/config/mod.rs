//! Configuration module
//!
//! Handles loading, validating and layering configuration.

#![allow(dead_code)]

mod env;
mod file;

pub use env::{mask, print_env_help, EnvConfig};
pub use file::{expand_path, is_yaml_file, ConfigFile, CONFIG_LOCATIONS};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::gateway::{GOOGLE_BASE_URL, OPENAI_BASE_URL};
use crate::models::DEFAULT_TIMEOUT_MS;
use crate::output::OutputFormat;

pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 300_000;

/// Configuration problems, reported together
#[derive(Error, Debug)]
pub struct ConfigError(pub Vec<String>);

impl ConfigError {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration errors:")?;
        for error in &self.0 {
            write!(f, "\n  • {error}")?;
        }
        Ok(())
    }
}

/// Application configuration
///
/// Run options are optional so that CLI flags, the file and environment
/// fallbacks can be layered; the accessors apply the final defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Providers to test; empty means every registered provider
    pub providers: Vec<String>,

    /// Suites to run by name; empty means all
    pub suites: Vec<String>,

    pub parallel: Option<bool>,

    /// Per-call timeout in milliseconds
    #[serde(alias = "timeout")]
    pub timeout_ms: Option<u64>,

    /// Cap on in-flight tasks per suite
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    pub verbose: bool,

    /// Report format name
    pub format: Option<String>,

    /// Report file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Extra suite definition files
    pub suite_files: Vec<String>,

    pub include_builtin_suites: bool,

    pub openai: ProviderSettings,

    pub google: ProviderSettings,

    pub judge: JudgeSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            suites: Vec::new(),
            parallel: None,
            timeout_ms: None,
            max_concurrency: None,
            verbose: false,
            format: None,
            output: None,
            suite_files: Vec::new(),
            include_builtin_suites: true,
            openai: ProviderSettings::default(),
            google: ProviderSettings::default(),
            judge: JudgeSettings::default(),
            log_level: None,
        }
    }
}

/// Credentials and endpoint for one provider
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(alias = "api_key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(alias = "base_url", alias = "baseURL", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderSettings {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Model used for AI-judged assertions
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeSettings {
    pub provider: String,
    pub model: String,
    /// Judge call timeout; defaults to the run timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4.1-mini".to_string(),
            timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml_file(path) {
            serde_yaml::to_string(self).context("Failed to serialize config")?
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")?
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    /// Configured format, console when unset or unknown
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .as_deref()
            .and_then(OutputFormat::from_str)
            .unwrap_or(OutputFormat::Console)
    }

    pub fn openai_base_url(&self) -> String {
        self.openai
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
    }

    pub fn google_base_url(&self) -> String {
        self.google
            .base_url
            .clone()
            .unwrap_or_else(|| GOOGLE_BASE_URL.to_string())
    }

    /// Check everything a run needs, collecting every problem
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !self.openai.has_key() && !self.google.has_key() {
            errors.push(
                "At least one API key must be provided (OPENAI_API_KEY or GOOGLE_API_KEY)"
                    .to_string(),
            );
        }

        if let Some(key) = self.openai.api_key.as_deref().filter(|k| !k.is_empty()) {
            if !key.starts_with("sk-") {
                errors.push(
                    "OpenAI API key appears to be invalid (should start with 'sk-')".to_string(),
                );
            }
        }

        if let Some(timeout) = self.timeout_ms {
            if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout) {
                errors.push(format!(
                    "Timeout should be between {MIN_TIMEOUT_MS}ms (1s) and {MAX_TIMEOUT_MS}ms (5min), got {timeout}ms"
                ));
            }
        }

        if let Some(format) = self.format.as_deref() {
            if OutputFormat::from_str(format).is_none() {
                let known: Vec<_> = OutputFormat::all().iter().map(|f| f.name()).collect();
                errors.push(format!(
                    "Unknown output format '{}' (expected one of: {})",
                    format,
                    known.join(", ")
                ));
            }
        }

        if self.max_concurrency == Some(0) {
            errors.push("max_concurrency must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError(errors))
        }
    }
}
