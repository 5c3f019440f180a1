//! Logging setup
//!
//! Diagnostics go to stderr through `tracing`, keeping stdout for reports.

use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// First parseable candidate wins; `verbose` lifts the fallback to debug
    pub fn resolve<'a, I>(candidates: I, verbose: bool) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find_map(Self::from_str)
            .unwrap_or(if verbose { LogLevel::Debug } else { LogLevel::Info })
    }

    /// Filter directive scoped to this crate
    pub fn directive(self) -> String {
        format!("prompt_eval={}", Level::from(self))
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_logger(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.directive()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str(" DEBUG "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("loud"), None);
    }

    #[test]
    fn test_log_level_resolve() {
        assert_eq!(LogLevel::resolve([None, Some("warn")], false), LogLevel::Warn);
        assert_eq!(
            LogLevel::resolve([Some("bogus"), Some("error")], true),
            LogLevel::Error
        );
        assert_eq!(LogLevel::resolve([None, None], false), LogLevel::Info);
        assert_eq!(LogLevel::resolve([None], true), LogLevel::Debug);
    }

    #[test]
    fn test_directive() {
        assert_eq!(LogLevel::Trace.directive(), "prompt_eval=TRACE");
        assert_eq!(LogLevel::Warn.directive(), "prompt_eval=WARN");
    }
}
