//! Environment variable configuration
//!
//! Environment variables are fallbacks: they only fill what the config file
//! left unset.

use std::env;

use super::AppConfig;

/// Environment variable prefix for tool settings
const ENV_PREFIX: &str = "PROMPT_EVAL";

/// Configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvConfig {
    /// OPENAI_API_KEY
    pub openai_api_key: Option<String>,
    /// OPENAI_BASE_URL
    pub openai_base_url: Option<String>,
    /// GOOGLE_API_KEY
    pub google_api_key: Option<String>,
    /// DEFAULT_TIMEOUT in milliseconds
    pub timeout_ms: Option<u64>,
    /// DEFAULT_PARALLEL
    pub parallel: Option<bool>,
    /// OUTPUT_FORMAT
    pub format: Option<String>,
    /// OUTPUT_FILE
    pub output: Option<String>,
    /// PROMPT_EVAL_CONFIG
    pub config_file: Option<String>,
    /// PROMPT_EVAL_VERBOSE
    pub verbose: Option<bool>,
    /// PROMPT_EVAL_LOG_LEVEL
    pub log_level: Option<String>,
}

impl EnvConfig {
    /// Load configuration from the process environment
    pub fn load() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let prefixed = |name: &str| get(&format!("{ENV_PREFIX}_{name}"));

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            google_api_key: get("GOOGLE_API_KEY"),
            timeout_ms: get("DEFAULT_TIMEOUT").and_then(|v| v.trim().parse().ok()),
            parallel: get("DEFAULT_PARALLEL").map(|v| parse_bool(&v)),
            format: get("OUTPUT_FORMAT"),
            output: get("OUTPUT_FILE"),
            config_file: prefixed("CONFIG"),
            verbose: prefixed("VERBOSE").map(|v| parse_bool(&v)),
            log_level: prefixed("LOG_LEVEL"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        *self != Self::default()
    }

    /// Fill every setting the config file left unset
    pub fn apply_to(&self, config: &mut AppConfig) {
        fill(&mut config.openai.api_key, &self.openai_api_key);
        fill(&mut config.openai.base_url, &self.openai_base_url);
        fill(&mut config.google.api_key, &self.google_api_key);
        fill(&mut config.timeout_ms, &self.timeout_ms);
        fill(&mut config.parallel, &self.parallel);
        fill(&mut config.format, &self.format);
        fill(&mut config.output, &self.output);
        fill(&mut config.log_level, &self.log_level);
        if self.verbose == Some(true) {
            config.verbose = true;
        }
    }

    /// Print current environment configuration, secrets masked
    pub fn print_summary(&self) {
        println!("Environment Configuration:");
        println!("  OPENAI_API_KEY:         {}", mask(&self.openai_api_key));
        println!("  OPENAI_BASE_URL:        {:?}", self.openai_base_url);
        println!("  GOOGLE_API_KEY:         {}", mask(&self.google_api_key));
        println!("  DEFAULT_TIMEOUT:        {:?}", self.timeout_ms);
        println!("  DEFAULT_PARALLEL:       {:?}", self.parallel);
        println!("  OUTPUT_FORMAT:          {:?}", self.format);
        println!("  OUTPUT_FILE:            {:?}", self.output);
        println!("  {ENV_PREFIX}_CONFIG:     {:?}", self.config_file);
        println!("  {ENV_PREFIX}_VERBOSE:    {:?}", self.verbose);
        println!("  {ENV_PREFIX}_LOG_LEVEL:  {:?}", self.log_level);
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

/// Show only that a secret is present, plus its last four characters
pub fn mask(secret: &Option<String>) -> String {
    match secret {
        None => "<unset>".to_string(),
        Some(s) => {
            let chars: Vec<char> = s.chars().collect();
            if chars.len() <= 8 {
                "****".to_string()
            } else {
                let tail: String = chars[chars.len() - 4..].iter().collect();
                format!("****{tail}")
            }
        }
    }
}

/// Print all recognised environment variables
pub fn print_env_help() {
    println!("Environment Variables (fallbacks for the config file):");
    println!();
    println!("  OPENAI_API_KEY            OpenAI API key");
    println!("  OPENAI_BASE_URL           OpenAI-compatible endpoint");
    println!("  GOOGLE_API_KEY            Google AI API key");
    println!("  DEFAULT_TIMEOUT           Default timeout in milliseconds");
    println!("  DEFAULT_PARALLEL          Run tests in parallel by default (true/false)");
    println!("  OUTPUT_FORMAT             Default output format (console, json, markdown, html, csv)");
    println!("  OUTPUT_FILE               Default output file path");
    println!("  {ENV_PREFIX}_CONFIG        Path to configuration file");
    println!("  {ENV_PREFIX}_VERBOSE       Enable verbose output (true/false)");
    println!("  {ENV_PREFIX}_LOG_LEVEL     Log level (trace, debug, info, warn, error)");
}
