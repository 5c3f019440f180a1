//! Test result models
//!
//! Per-assertion outcomes, per-task results and the aggregated run record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PromptSpec;

/// Result of one assertion applied to one response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssertionOutcome {
    pub passed: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AssertionOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
        }
    }

    /// Pass or fail with one of two messages
    pub fn from_check(passed: bool, pass_msg: String, fail_msg: String) -> Self {
        if passed {
            Self::pass(pass_msg)
        } else {
            Self::fail(fail_msg)
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Lifecycle of a single task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    /// A response was produced; assertions may still have failed
    Succeeded,
    /// No response could be produced
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Succeeded => write!(f, "SUCCEEDED"),
            TaskState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one (prompt, provider, model) execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskResult {
    pub prompt_id: String,
    pub prompt_name: String,
    pub provider: String,
    pub model: String,
    pub response: String,
    pub response_time_ms: u64,
    pub assertions: Vec<AssertionOutcome>,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    /// Result for a task that produced a response
    pub fn completed(
        prompt: &PromptSpec,
        provider: impl Into<String>,
        model: impl Into<String>,
        response: String,
        response_time_ms: u64,
        assertions: Vec<AssertionOutcome>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let passed = assertions.iter().all(|a| a.passed);
        Self {
            prompt_id: prompt.id.clone(),
            prompt_name: prompt.name.clone(),
            provider: provider.into(),
            model: model.into(),
            response,
            response_time_ms,
            assertions,
            passed,
            timestamp,
            error: None,
        }
    }

    /// Result for a task whose execution failed before assertions could run
    pub fn failed(
        prompt: &PromptSpec,
        provider: impl Into<String>,
        model: impl Into<String>,
        error: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            prompt_id: prompt.id.clone(),
            prompt_name: prompt.name.clone(),
            provider: provider.into(),
            model: model.into(),
            response: String::new(),
            response_time_ms: 0,
            assertions: Vec::new(),
            passed: false,
            timestamp,
            error: Some(error.into()),
        }
    }

    pub fn state(&self) -> TaskState {
        if self.error.is_some() {
            TaskState::Failed
        } else {
            TaskState::Succeeded
        }
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionOutcome> {
        self.assertions.iter().filter(|a| !a.passed)
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.passed { "✓" } else { "✗" };
        write!(
            f,
            "{} {} - {}/{}: {}",
            symbol,
            self.prompt_name,
            self.provider,
            self.model,
            self.status_label()
        )?;
        if let Some(error) = &self.error {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// Aggregate counts for a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    /// Single pass over the results; `failed` is derived, never counted
    pub fn from_results(results: &[TaskResult], duration_ms: u64) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            duration_ms,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Effective configuration a run executed with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub providers: Vec<String>,
    pub parallel: bool,
    pub timeout_ms: u64,
}

/// One full invocation across one or more suites
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub suite_names: Vec<String>,
    pub results: Vec<TaskResult>,
    pub summary: RunSummary,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub config: RunConfig,
}

impl RunRecord {
    /// Builds the record, deriving the summary from exactly `results`
    pub fn new(
        suite_names: Vec<String>,
        results: Vec<TaskResult>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        config: RunConfig,
    ) -> Self {
        let duration_ms = (end_time - start_time).num_milliseconds().max(0) as u64;
        let summary = RunSummary::from_results(&results, duration_ms);
        Self {
            id: format!("test-run-{}", start_time.timestamp_millis()),
            suite_names,
            results,
            summary,
            start_time,
            end_time,
            config,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

impl fmt::Display for RunRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run {} - {}", self.id, self.suite_names.join(", "))?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for result in &self.results {
            writeln!(f, "  {result}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {}",
            self.summary.total, self.summary.passed, self.summary.failed
        )?;
        writeln!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.summary.pass_rate(),
            self.summary.duration_ms
        )
    }
}
