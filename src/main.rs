//! prompt-eval - LLM prompt evaluation
//!
//! A CLI tool that runs suites of prompts against several LLM providers and
//! models, checks every response with assertions and reports the outcome.
//!
//! ## Features
//!
//! - OpenAI and Google Gemini providers, several models per provider
//! - Built-in and file-defined (YAML/JSON) test suites
//! - Rule-based and AI-judged assertions
//! - Sequential or parallel execution with per-call timeouts
//! - Multiple output formats (Console, JSON, Markdown, HTML, CSV)
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite against every configured provider
//! prompt-eval run
//!
//! # Run one suite against two Gemini models
//! prompt-eval run --suite "Code Generation" --model google=gemini-2.5-flash --model google=gemini-2.5-pro
//!
//! # Write an HTML report
//! prompt-eval run --format html --output report.html
//!
//! # List suites and providers
//! prompt-eval list --detailed
//! ```

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod assertions;
mod cli;
mod config;
mod executor;
mod gateway;
mod http;
mod models;
mod output;
mod suites;
mod utils;

use assertions::Judge;
use cli::{Args, Command, ConfigAction, ListArgs, RunArgs};
use config::{
    expand_path, mask, print_env_help, AppConfig, ConfigFile, EnvConfig, CONFIG_LOCATIONS,
};
use executor::TestEngine;
use gateway::{ProviderEntry, ProviderRegistry};
use models::{ExecutionOptions, Suite};
use output::{report_path, reporter_for, write_report_to_file, OutputFormat};
use suites::SuiteFile;
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let env = EnvConfig::load();
    let config_path = args.config.clone().or_else(|| env.config_file.clone());
    let (mut config, source) = ConfigFile::load_or_default(config_path.as_deref())?;
    env.apply_to(&mut config);
    if args.verbose {
        config.verbose = true;
    }

    init_logger(LogLevel::resolve(
        [args.log_level.as_deref(), config.log_level.as_deref()],
        config.verbose,
    ));
    if let Some(path) = &source {
        info!("Using configuration file {}", path.display());
    }

    match args.command {
        Command::Run(run_args) => run_tests(config, run_args).await,
        Command::List(list_args) => {
            list_suites(&config, list_args)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config(config_args) => manage_config(config, source, &env, config_args.action),
    }
}

/// CLI flags take precedence over the file and environment
fn apply_run_args(config: &mut AppConfig, args: &RunArgs) {
    if !args.suites.is_empty() {
        config.suites = args.suites.clone();
    }
    if !args.providers.is_empty() {
        config.providers = args.providers.clone();
    }
    if let Some(parallel) = args.parallel_override() {
        config.parallel = Some(parallel);
    }
    if args.timeout.is_some() {
        config.timeout_ms = args.timeout;
    }
    if args.concurrency.is_some() {
        config.max_concurrency = args.concurrency;
    }
    if args.format.is_some() {
        config.format = args.format.clone();
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    config.suite_files.extend(args.suite_files.iter().cloned());
    if args.no_builtin {
        config.include_builtin_suites = false;
    }
}

fn execution_options(config: &AppConfig, args: &RunArgs) -> ExecutionOptions {
    ExecutionOptions {
        providers: (!config.providers.is_empty()).then(|| config.providers.clone()),
        models: args.model_overrides(),
        timeout_ms: Some(config.timeout_ms()),
        parallel: Some(config.parallel()),
        max_concurrency: config.max_concurrency,
        verbose: config.verbose,
    }
}

/// Judge model for AI-judged assertions, if its provider is configured
fn build_judge(config: &AppConfig, registry: &ProviderRegistry) -> Option<Arc<Judge>> {
    let settings = &config.judge;
    match registry.resolve(&settings.provider, &settings.model) {
        Ok(model) => {
            let timeout = settings.timeout_ms.unwrap_or_else(|| config.timeout_ms());
            Some(Arc::new(
                Judge::new(model, format!("{}/{}", settings.provider, settings.model))
                    .with_timeout(Duration::from_millis(timeout)),
            ))
        }
        Err(e) => {
            warn!("AI-judged assertions disabled: {}", e);
            None
        }
    }
}

/// Built-in suites followed by suite files, in configuration order
fn load_all_suites(config: &AppConfig, judge: Option<&Arc<Judge>>) -> Result<Vec<Suite>> {
    let mut all = if config.include_builtin_suites {
        suites::builtin(judge)?
    } else {
        Vec::new()
    };

    for path in &config.suite_files {
        let file = SuiteFile::load(expand_path(path))?;
        if judge.is_none() && file.needs_judge() {
            anyhow::bail!(
                "Suite file {path} uses AI-judged assertions but judge model {}/{} is not available",
                config.judge.provider,
                config.judge.model
            );
        }
        all.extend(file.build(judge)?);
    }

    Ok(all)
}

async fn run_tests(mut config: AppConfig, args: RunArgs) -> Result<ExitCode> {
    apply_run_args(&mut config, &args);

    if let Err(e) = config.validate() {
        eprintln!("❌ {e}");
        eprintln!("\nCheck your configuration file or environment variables.");
        eprintln!("Run `prompt-eval config init` to create an example configuration.\n");
        return Ok(ExitCode::FAILURE);
    }

    let registry = Arc::new(ProviderRegistry::from_config(&config)?);
    let judge = build_judge(&config, &registry);

    let selected = match load_all_suites(&config, judge.as_ref())
        .and_then(|all| suites::select(all, &config.suites))
    {
        Ok(selected) => selected,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let options = execution_options(&config, &args);

    println!("🤖 Prompt Evaluation");
    println!("========================================\n");
    println!("Running {} test suite(s):", selected.len());
    for suite in &selected {
        println!("  • {}", suite.name);
    }
    println!(
        "Providers: {}",
        options
            .providers
            .as_ref()
            .map(|p| p.join(", "))
            .unwrap_or_else(|| "all".to_string())
    );
    println!("Parallel: {}", if config.parallel() { "Yes" } else { "No" });
    println!("Timeout: {}ms\n", config.timeout_ms());

    let engine = TestEngine::new(registry);
    let record = engine.run_suites(&selected, &options).await;

    let format = config.output_format();
    let colorize = config.output.is_none() && std::io::stdout().is_terminal();
    let reporter = reporter_for(format, colorize);
    let report = reporter.render(&record);

    if let Some(output) = &config.output {
        let path = report_path(output, reporter.as_ref());
        write_report_to_file(&path, &report)?;
        println!("📄 Report saved to: {}", path.display());
    }
    if format == OutputFormat::Console || config.output.is_none() {
        println!("{report}");
    }

    Ok(if record.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn list_suites(config: &AppConfig, args: ListArgs) -> Result<()> {
    let registry = ProviderRegistry::from_config(config)?;
    let judge = build_judge(config, &registry);
    let all = load_all_suites(config, judge.as_ref())?;

    println!("\nTest Suites ({} total)\n", all.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for suite in &all {
        println!(
            "\n{} ({} prompts, timeout {}, {})",
            suite.name,
            suite.prompts.len(),
            suite
                .config
                .timeout_ms
                .map(|t| format!("{t}ms"))
                .unwrap_or_else(|| "default".to_string()),
            if suite.config.parallel.unwrap_or(false) {
                "parallel"
            } else {
                "sequential"
            }
        );
        if let Some(description) = &suite.description {
            println!("  {description}");
        }
        println!("──────────────────────────────────────────────────────────────────────");

        for prompt in &suite.prompts {
            println!("  {:22} {}", prompt.id, prompt.name);
            if args.detailed {
                for assertion in prompt.assertions.iter().chain(&suite.global_assertions) {
                    println!("      - {}", assertion.describe());
                }
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    if registry.is_empty() {
        println!("No providers configured (set OPENAI_API_KEY or GOOGLE_API_KEY).\n");
    } else {
        println!("Configured Providers:\n");
        for provider in registry.providers() {
            println!("  - {}", provider_line(provider));
        }
        match &judge {
            Some(judge) => println!("\n  Judge model: {}", judge.label()),
            None => println!("\n  Judge model: unavailable (AI-judged assertions skipped)"),
        }
        println!();
    }

    Ok(())
}

fn provider_line(provider: &ProviderEntry) -> String {
    format!(
        "{:10} {:10} default: {:18} models: {}",
        provider.name,
        provider.display_name,
        provider.default_model,
        provider.model_names().collect::<Vec<_>>().join(", ")
    )
}

fn manage_config(
    config: AppConfig,
    source: Option<PathBuf>,
    env: &EnvConfig,
    action: ConfigAction,
) -> Result<ExitCode> {
    match action {
        ConfigAction::Init { output, force } => {
            ConfigFile::init(&output, force)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to add your API keys and preferred suites.");
        }

        ConfigAction::Show { format, env: show_env } => {
            match &source {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!(
                    "# No configuration file found in {}, showing defaults",
                    CONFIG_LOCATIONS.join(", ")
                ),
            }

            let mut shown = config;
            for settings in [&mut shown.openai, &mut shown.google] {
                if settings.api_key.is_some() {
                    settings.api_key = Some(mask(&settings.api_key));
                }
            }

            let rendered = if format == "json" {
                serde_json::to_string_pretty(&shown)?
            } else {
                serde_yaml::to_string(&shown)?
            };
            println!("{rendered}");

            if show_env {
                println!();
                env.print_summary();
                println!();
                print_env_help();
            }
        }

        ConfigAction::Validate { file } => {
            let (checked, label) = match file {
                Some(file) => {
                    let mut loaded = AppConfig::load(expand_path(&file))?;
                    env.apply_to(&mut loaded);
                    (loaded, file)
                }
                None => {
                    let label = source
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "defaults + environment".to_string());
                    (config, label)
                }
            };

            match checked.validate() {
                Ok(()) => println!("✓ Configuration is valid: {label}"),
                Err(e) => {
                    println!("✗ Configuration is invalid: {label}");
                    println!("{e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["prompt-eval", "run"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Command::Run(run) => run,
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_flags_override_file_values() {
        let mut config = AppConfig {
            suites: vec!["Creative Writing".to_string()],
            parallel: Some(true),
            timeout_ms: Some(10_000),
            format: Some("json".to_string()),
            ..AppConfig::default()
        };

        let args = run_args(&["--suite", "Code Generation", "--sequential", "--timeout", "5000"]);
        apply_run_args(&mut config, &args);

        assert_eq!(config.suites, vec!["Code Generation"]);
        assert!(!config.parallel());
        assert_eq!(config.timeout_ms(), 5_000);
        assert_eq!(config.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_execution_options_defaults() {
        let config = AppConfig::default();
        let options = execution_options(&config, &run_args(&[]));

        assert_eq!(options.providers, None);
        assert_eq!(options.parallel, Some(true));
        assert_eq!(options.timeout_ms, Some(30_000));
        assert!(options.models.is_empty());
    }

    #[test]
    fn test_execution_options_from_flags() {
        let mut config = AppConfig::default();
        let args = run_args(&["--provider", "google", "--model", "google=gemini-2.5-pro", "--concurrency", "2"]);
        apply_run_args(&mut config, &args);
        let options = execution_options(&config, &args);

        assert_eq!(options.providers, Some(vec!["google".to_string()]));
        assert_eq!(options.models["google"], vec!["gemini-2.5-pro"]);
        assert_eq!(options.max_concurrency, Some(2));
    }

    #[test]
    fn test_provider_line() {
        let mut config = AppConfig::default();
        config.google.api_key = Some("g-key".to_string());
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let line = provider_line(&registry.providers()[0]);
        assert!(line.starts_with("google"));
        assert!(line.contains("default: gemini-2.5-flash"));
        assert!(line.ends_with("models: gemini-2.5-flash, gemini-2.5-pro"));
    }

    #[test]
    fn test_no_judge_without_judge_provider() {
        let mut config = AppConfig::default();
        config.google.api_key = Some("g-key".to_string());
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert!(build_judge(&config, &registry).is_none());

        config.judge.provider = "google".to_string();
        config.judge.model = "gemini-2.5-flash".to_string();
        let judge = build_judge(&config, &registry).unwrap();
        assert_eq!(judge.label(), "google/gemini-2.5-flash");
    }

    #[test]
    fn test_judged_suite_file_without_judge_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("judged.yaml");
        std::fs::write(
            &path,
            "suites:\n  - name: Judged\n    prompts:\n      - id: j\n        name: J\n        \
             prompt: hi\n        assertions:\n          - type: judge\n            question: Is it kind?\n",
        )
        .unwrap();

        let config = AppConfig {
            suite_files: vec![path.to_string_lossy().to_string()],
            include_builtin_suites: false,
            ..AppConfig::default()
        };
        let err = load_all_suites(&config, None).unwrap_err();
        assert!(err.to_string().contains("judge model openai/gpt-4.1-mini is not available"));
    }

    #[test]
    fn test_load_all_suites_appends_files_then_selects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extra.yaml");
        std::fs::write(
            &path,
            "suites:\n  - name: Extra\n    prompts:\n      - id: e\n        name: E\n        prompt: hi\n",
        )
        .unwrap();

        let config = AppConfig {
            suite_files: vec![path.to_string_lossy().to_string()],
            ..AppConfig::default()
        };
        let all = load_all_suites(&config, None).unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Creative Writing", "Code Generation", "Extra"]);

        let picked = suites::select(all, &["Extra".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);

        let only_file = AppConfig {
            include_builtin_suites: false,
            ..config
        };
        assert_eq!(load_all_suites(&only_file, None).unwrap().len(), 1);
    }
}
