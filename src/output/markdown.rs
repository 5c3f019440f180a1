//! Markdown report

use super::formatter::{format_duration, group_by_provider, pass_rate, yes_no, OutputFormat, Reporter};
use crate::models::{RunRecord, TaskResult};

pub struct MarkdownReporter;

impl MarkdownReporter {
    fn format_section(title: &str, results: &[&TaskResult], passed: bool) -> String {
        let mut output = format!("{title}\n\n");
        let status = if passed { "✅" } else { "❌" };

        for (provider, group) in group_by_provider(results.iter().copied()) {
            output.push_str(&format!("### 📊 {} ({} tests)\n\n", provider, group.len()));

            for result in group {
                output.push_str(&format!(
                    "{} **{}** ({}) - {}ms\n",
                    status, result.prompt_name, result.model, result.response_time_ms
                ));

                if let Some(error) = &result.error {
                    output.push_str(&format!("   > 🚨 **Error:** {error}\n"));
                } else if !passed {
                    for assertion in result.failed_assertions() {
                        output.push_str(&format!("   > • {}\n", assertion.message));
                    }
                }

                output.push('\n');
            }
        }

        output
    }
}

impl Reporter for MarkdownReporter {
    fn render(&self, run: &RunRecord) -> String {
        let summary = &run.summary;
        let mut output = String::from("# 🤖 Test Run Report\n\n");

        output.push_str(&format!("**Run ID:** {}  \n", run.id));
        output.push_str(&format!(
            "**Duration:** {}s  \n",
            format_duration(summary.duration_ms)
        ));
        output.push_str(&format!("**Total Tests:** {}  \n", summary.total));
        output.push_str(&format!(
            "**✅ Passed:** {} ({}%)  \n",
            summary.passed,
            pass_rate(summary.passed, summary.total)
        ));
        output.push_str(&format!("**❌ Failed:** {}  \n", summary.failed));
        output.push_str(&format!(
            "**Providers:** {}  \n",
            run.config.providers.join(", ")
        ));
        output.push_str(&format!("**Parallel:** {}  \n\n", yes_no(run.config.parallel)));

        let (passed, failed): (Vec<&TaskResult>, Vec<&TaskResult>) =
            run.results.iter().partition(|r| r.passed);

        if !passed.is_empty() {
            output.push_str(&Self::format_section("## ✅ Passed Tests", &passed, true));
        }
        if !failed.is_empty() {
            output.push_str(&Self::format_section("## ❌ Failed Tests", &failed, false));
        }

        output
    }

    fn file_extension(&self) -> &'static str {
        OutputFormat::Markdown.extension()
    }
}
