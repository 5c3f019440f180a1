//! Configuration file management
//!
//! Handles finding, loading, and writing configuration files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{AppConfig, ProviderSettings};

/// Configuration file locations (in order of precedence)
pub const CONFIG_LOCATIONS: &[&str] = &[
    "./prompt-eval.yaml",
    "./prompt-eval.yml",
    "./config.yml",
    "./config.yaml",
    "~/.config/prompt-eval/config.yaml",
];

/// Configuration file lookup
pub struct ConfigFile;

impl ConfigFile {
    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        Self::find_in(CONFIG_LOCATIONS)
    }

    fn find_in(locations: &[&str]) -> Option<PathBuf> {
        locations
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.is_file())
    }

    /// Load the explicit file if given, else the first one found, else defaults
    pub fn load_or_default(explicit: Option<&str>) -> Result<(AppConfig, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let path = expand_path(path);
            let config = AppConfig::load(&path)?;
            info!("Loaded configuration from {}", path.display());
            return Ok((config, Some(path)));
        }

        match Self::find() {
            Some(path) => {
                let config = AppConfig::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok((config, Some(path)))
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok((AppConfig::default(), None))
            }
        }
    }

    /// Write an example configuration, refusing to clobber unless `force`
    pub fn init(path: impl AsRef<Path>, force: bool) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        Self::example()
            .save(path)
            .with_context(|| format!("Failed to initialise {}", path.display()))
    }

    /// Generate example configuration
    pub fn example() -> AppConfig {
        AppConfig {
            providers: vec!["openai".to_string(), "google".to_string()],
            suites: vec!["Creative Writing".to_string(), "Code Generation".to_string()],
            parallel: Some(true),
            timeout_ms: Some(30_000),
            format: Some("console".to_string()),
            openai: ProviderSettings {
                api_key: Some("sk-your-openai-api-key".to_string()),
                base_url: None,
            },
            google: ProviderSettings {
                api_key: Some("your-google-api-key".to_string()),
                base_url: None,
            },
            ..AppConfig::default()
        }
    }
}

/// Expand ~ to home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
