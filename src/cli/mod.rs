//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::collections::HashMap;

/// LLM prompt evaluation across providers and models
#[derive(Parser, Debug)]
#[command(name = "prompt-eval")]
#[command(version)]
#[command(about = "Run prompt test suites against LLM providers and check the responses")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to the first of the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test suites
    Run(RunArgs),

    /// List suites, prompts and providers
    List(ListArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Suite to run by name (repeatable)
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// Provider to test (repeatable)
    #[arg(short, long = "provider")]
    pub providers: Vec<String>,

    /// Model override as provider=model (repeatable)
    #[arg(short, long = "model", value_parser = parse_model_override)]
    pub models: Vec<(String, String)>,

    /// Run tasks in parallel
    #[arg(long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Run tasks one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Timeout per model call in milliseconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Maximum concurrent tasks per suite (when parallel)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format (console, json, markdown, html, csv)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Save report to file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Additional suite file (repeatable)
    #[arg(long = "suite-file")]
    pub suite_files: Vec<String>,

    /// Skip the built-in suites
    #[arg(long)]
    pub no_builtin: bool,
}

impl RunArgs {
    /// `Some(true)` / `Some(false)` only when a flag was given
    pub fn parallel_override(&self) -> Option<bool> {
        match (self.parallel, self.sequential) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Model overrides grouped by provider, flag order preserved
    pub fn model_overrides(&self) -> HashMap<String, Vec<String>> {
        let mut overrides: HashMap<String, Vec<String>> = HashMap::new();
        for (provider, model) in &self.models {
            overrides
                .entry(provider.clone())
                .or_default()
                .push(model.clone());
        }
        overrides
    }
}

fn parse_model_override(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((provider, model)) if !provider.trim().is_empty() && !model.trim().is_empty() => {
            Ok((provider.trim().to_string(), model.trim().to_string()))
        }
        _ => Err(format!("expected provider=model, got '{value}'")),
    }
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show prompts and assertions for each suite
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "prompt-eval.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Also show environment variables
        #[arg(long)]
        env: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file path (defaults to the loaded configuration)
        file: Option<String>,
    },
}
