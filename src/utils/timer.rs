//! Timing helpers
//!
//! Millisecond timing for model calls and per-suite durations.

use std::time::{Duration, Instant};

/// Measures one model call
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Consume the timer, returning elapsed milliseconds
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::trace!("{} took {}ms", self.label, elapsed);
        elapsed
    }
}

/// Durations of suites run back to back
#[derive(Debug)]
pub struct SuiteTimings {
    last: Instant,
    suites: Vec<(String, Duration)>,
}

impl SuiteTimings {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            suites: Vec::new(),
        }
    }

    /// Close the span of a finished suite; the next span starts now
    pub fn finish(&mut self, suite: impl Into<String>) {
        let now = Instant::now();
        self.suites.push((suite.into(), now - self.last));
        self.last = now;
    }

    pub fn suites(&self) -> &[(String, Duration)] {
        &self.suites
    }

    pub fn total(&self) -> Duration {
        self.suites.iter().map(|(_, d)| *d).sum()
    }

    /// One `name: Nms` line per suite
    pub fn summary(&self) -> String {
        self.suites
            .iter()
            .map(|(name, d)| format!("  {}: {}ms", name, d.as_millis()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SuiteTimings {
    fn default() -> Self {
        Self::new()
    }
}
