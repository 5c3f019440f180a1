//! Output formatters for run records
//!
//! Console, JSON and CSV reporters plus the helpers shared with the
//! Markdown and HTML reporters.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{HtmlReporter, MarkdownReporter};
use crate::models::{RunRecord, TaskResult};

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Html,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" | "txt" => Some(OutputFormat::Console),
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "html" | "htm" => Some(OutputFormat::Html),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Console => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Console => "console",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Csv => "csv",
        }
    }

    pub fn all() -> &'static [OutputFormat] {
        &[
            OutputFormat::Console,
            OutputFormat::Json,
            OutputFormat::Markdown,
            OutputFormat::Html,
            OutputFormat::Csv,
        ]
    }
}

/// Renders a finished run
pub trait Reporter {
    fn render(&self, run: &RunRecord) -> String;

    fn file_extension(&self) -> &'static str;
}

/// Reporter for `format`; colors only apply to the console
pub fn reporter_for(format: OutputFormat, colorize: bool) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Console => {
            let reporter = ConsoleReporter::new();
            Box::new(if colorize { reporter } else { reporter.no_color() })
        }
        OutputFormat::Json => Box::new(JsonReporter),
        OutputFormat::Markdown => Box::new(MarkdownReporter),
        OutputFormat::Html => Box::new(HtmlReporter),
        OutputFormat::Csv => Box::new(CsvReporter),
    }
}

/// Group results by provider, providers in first-seen order
pub fn group_by_provider<'a, I>(results: I) -> Vec<(&'a str, Vec<&'a TaskResult>)>
where
    I: IntoIterator<Item = &'a TaskResult>,
{
    let mut groups: Vec<(&str, Vec<&TaskResult>)> = Vec::new();
    for result in results {
        match groups.iter_mut().find(|(p, _)| *p == result.provider) {
            Some((_, list)) => list.push(result),
            None => groups.push((result.provider.as_str(), vec![result])),
        }
    }
    groups
}

/// Percentage with one decimal; "0.0" for an empty run
pub fn pass_rate(passed: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", passed as f64 / total as f64 * 100.0)
}

/// Seconds with two decimals
pub fn format_duration(duration_ms: u64) -> String {
    format!("{:.2}", duration_ms as f64 / 1000.0)
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Plain-text report for terminals
pub struct ConsoleReporter {
    colorize: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { colorize: true }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.colorize {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, run: &RunRecord) -> String {
        let summary = &run.summary;
        let mut output = String::new();

        output.push_str("\n🤖 Test Run Report\n");
        output.push_str("==================\n");
        output.push_str(&format!("Run ID: {}\n", run.id));
        output.push_str(&format!("Duration: {}s\n", format_duration(summary.duration_ms)));
        output.push_str(&format!("Total Tests: {}\n", summary.total));
        output.push_str(&format!(
            "✅ Passed: {} ({}%)\n",
            self.paint(&summary.passed.to_string(), "32"),
            pass_rate(summary.passed, summary.total)
        ));
        let failed = if summary.failed > 0 {
            self.paint(&summary.failed.to_string(), "31")
        } else {
            summary.failed.to_string()
        };
        output.push_str(&format!("❌ Failed: {failed}\n"));
        output.push_str(&format!("Providers: {}\n", run.config.providers.join(", ")));
        output.push_str(&format!("Parallel: {}\n\n", yes_no(run.config.parallel)));

        output
    }

    fn format_passed(&self, results: &[&TaskResult]) -> String {
        let mut output = String::new();
        output.push_str("✅ Passed Tests by Provider:\n");
        output.push_str("============================\n");

        for (provider, group) in group_by_provider(results.iter().copied()) {
            output.push_str(&format!("\n📊 {}: {} tests\n", provider, group.len()));
            for result in group {
                output.push_str(&format!(
                    "   {} {} ({}) - {}ms\n",
                    self.paint("✓", "32"),
                    result.prompt_name,
                    result.model,
                    result.response_time_ms
                ));
            }
        }

        output.push('\n');
        output
    }

    fn format_failed(&self, results: &[&TaskResult]) -> String {
        let mut output = String::new();
        output.push_str("❌ Failed Tests by Provider:\n");
        output.push_str("============================\n");

        for (provider, group) in group_by_provider(results.iter().copied()) {
            output.push_str(&format!("\n📊 {}: {} tests\n", provider, group.len()));
            for result in group {
                output.push_str(&format!(
                    "   {} {} ({})\n",
                    self.paint("❌", "31"),
                    result.prompt_name,
                    result.model
                ));
                match &result.error {
                    Some(error) => output.push_str(&format!("      Error: {error}\n")),
                    None => {
                        for assertion in result.failed_assertions() {
                            output.push_str(&format!("      • {}\n", assertion.message));
                        }
                    }
                }
            }
        }

        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn render(&self, run: &RunRecord) -> String {
        let (passed, failed): (Vec<&TaskResult>, Vec<&TaskResult>) =
            run.results.iter().partition(|r| r.passed);

        let mut output = self.format_header(run);
        if !passed.is_empty() {
            output.push_str(&self.format_passed(&passed));
        }
        if !failed.is_empty() {
            output.push_str(&self.format_failed(&failed));
        }
        output
    }

    fn file_extension(&self) -> &'static str {
        OutputFormat::Console.extension()
    }
}

/// Pretty-printed run record
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn render(&self, run: &RunRecord) -> String {
        serde_json::to_string_pretty(run).unwrap_or_else(|e| {
            warn!("Failed to serialize run {}: {}", run.id, e);
            String::new()
        })
    }

    fn file_extension(&self) -> &'static str {
        OutputFormat::Json.extension()
    }
}

/// One row per task result
pub struct CsvReporter;

impl CsvReporter {
    const HEADER: [&'static str; 10] = [
        "prompt_id",
        "prompt_name",
        "provider",
        "model",
        "passed",
        "response_time_ms",
        "assertions_passed",
        "assertions_total",
        "timestamp",
        "error",
    ];

    fn write_rows(run: &RunRecord) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(Self::HEADER)?;

        for result in &run.results {
            let assertions_passed = result.assertions.iter().filter(|a| a.passed).count();
            writer.write_record([
                result.prompt_id.clone(),
                result.prompt_name.clone(),
                result.provider.clone(),
                result.model.clone(),
                result.passed.to_string(),
                result.response_time_ms.to_string(),
                assertions_passed.to_string(),
                result.assertions.len().to_string(),
                result.timestamp.to_rfc3339(),
                result.error.clone().unwrap_or_default(),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Reporter for CsvReporter {
    fn render(&self, run: &RunRecord) -> String {
        Self::write_rows(run).unwrap_or_else(|e| {
            warn!("Failed to write CSV for run {}: {}", run.id, e);
            String::new()
        })
    }

    fn file_extension(&self) -> &'static str {
        OutputFormat::Csv.extension()
    }
}

/// Output path with the reporter's extension added when it has none
pub fn report_path(path: &str, reporter: &dyn Reporter) -> PathBuf {
    let mut path = PathBuf::from(path);
    if path.extension().is_none() {
        path.set_extension(reporter.file_extension());
    }
    path
}

/// Write a rendered report to a file
pub fn write_report_to_file(path: impl AsRef<Path>, content: &str) -> anyhow::Result<()> {
    let path = path.as_ref();
    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    info!("Report saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{Duration, TimeZone, Utc};

    use crate::models::{AssertionOutcome, PromptSpec, RunConfig, RunRecord, TaskResult};

    pub fn sample_run() -> RunRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let story = PromptSpec::new("story", "Story Opening", "Write");
        let json = PromptSpec::new("json", "JSON <Schema>", "Make");

        let results = vec![
            TaskResult::completed(
                &story,
                "openai",
                "gpt-4.1-mini",
                "Once upon a time".to_string(),
                120,
                vec![AssertionOutcome::pass("ok")],
                start,
            ),
            TaskResult::completed(
                &json,
                "google",
                "gemini-2.5-flash",
                "nope".to_string(),
                80,
                vec![
                    AssertionOutcome::pass("ok"),
                    AssertionOutcome::fail("Response is not valid JSON"),
                ],
                start,
            ),
            TaskResult::failed(&story, "google", "gemini-2.5-pro", "Model call timed out after 30000ms", start),
        ];

        RunRecord::new(
            vec!["Creative Writing".to_string()],
            results,
            start,
            start + Duration::milliseconds(1234),
            RunConfig {
                providers: vec!["openai".to_string(), "google".to_string()],
                parallel: true,
                timeout_ms: 30_000,
            },
        )
    }

    pub fn empty_run() -> RunRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        RunRecord::new(
            Vec::new(),
            Vec::new(),
            start,
            start,
            RunConfig {
                providers: Vec::new(),
                parallel: false,
                timeout_ms: 30_000,
            },
        )
    }
}
