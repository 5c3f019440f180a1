//! Standalone HTML report

use super::formatter::{format_datetime, format_duration, group_by_provider, pass_rate, OutputFormat, Reporter};
use crate::models::{RunRecord, TaskResult};

const STYLE: &str = r#"
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; background: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-bottom: 30px; }
        .stat-card { background: #f8f9fa; padding: 20px; border-radius: 8px; text-align: center; }
        .stat-value { font-size: 2em; font-weight: bold; margin-bottom: 5px; }
        .stat-label { color: #666; font-size: 0.9em; }
        .pass { color: #28a745; }
        .fail { color: #dc3545; }
        .section-title { font-size: 1.2em; font-weight: bold; margin-bottom: 15px; padding-bottom: 5px; border-bottom: 2px solid #eee; }
        .provider-title { font-weight: bold; color: #495057; margin-bottom: 10px; }
        .test-item { background: #f8f9fa; margin: 8px 0; padding: 15px; border-radius: 6px; border-left: 4px solid #ccc; }
        .test-item.pass { border-left-color: #28a745; }
        .test-item.fail { border-left-color: #dc3545; }
        .test-name { font-weight: bold; }
        .test-details { font-size: 0.9em; color: #666; margin-top: 5px; }
        .assertion { margin: 5px 0; font-size: 0.85em; }
        .error { background: #f8d7da; color: #721c24; padding: 10px; border-radius: 4px; margin-top: 10px; }
"#;

pub struct HtmlReporter;

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl HtmlReporter {
    fn stat_card(value: &str, label: &str, class: &str) -> String {
        format!(
            r#"
            <div class="stat-card">
                <div class="stat-value {class}">{value}</div>
                <div class="stat-label">{label}</div>
            </div>"#
        )
    }

    fn format_section(title: &str, results: &[&TaskResult], passed: bool) -> String {
        let class = if passed { "pass" } else { "fail" };
        let mut output = format!(
            r#"
        <div class="section">
            <h2 class="section-title">{title}</h2>"#
        );

        for (provider, group) in group_by_provider(results.iter().copied()) {
            output.push_str(&format!(
                r#"
            <div class="test-group">
                <div class="provider-title">📊 {} ({} tests)</div>"#,
                escape(provider),
                group.len()
            ));

            for result in group {
                output.push_str(&format!(
                    r#"
                <div class="test-item {}">
                    <div class="test-name">{}</div>
                    <div class="test-details">Model: {} | Response Time: {}ms</div>"#,
                    class,
                    escape(&result.prompt_name),
                    escape(&result.model),
                    result.response_time_ms
                ));

                if let Some(error) = &result.error {
                    output.push_str(&format!(
                        r#"
                    <div class="error">Error: {}</div>"#,
                        escape(error)
                    ));
                } else if !passed {
                    for assertion in result.failed_assertions() {
                        output.push_str(&format!(
                            r#"
                    <div class="assertion fail">• {}</div>"#,
                            escape(&assertion.message)
                        ));
                    }
                }

                output.push_str("\n                </div>");
            }

            output.push_str("\n            </div>");
        }

        output.push_str("\n        </div>");
        output
    }
}

impl Reporter for HtmlReporter {
    fn render(&self, run: &RunRecord) -> String {
        let summary = &run.summary;
        let (passed, failed): (Vec<&TaskResult>, Vec<&TaskResult>) =
            run.results.iter().partition(|r| r.passed);

        let mut output = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Prompt Evaluation Report - {id}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>🤖 Prompt Evaluation Report</h1>
            <p>Run ID: {id}</p>
            <p>Generated: {generated}</p>
        </div>
        <div class="summary">"#,
            id = escape(&run.id),
            generated = format_datetime(&run.end_time),
        );

        output.push_str(&Self::stat_card(&summary.total.to_string(), "Total Tests", ""));
        output.push_str(&Self::stat_card(
            &summary.passed.to_string(),
            &format!("Passed ({}%)", pass_rate(summary.passed, summary.total)),
            "pass",
        ));
        output.push_str(&Self::stat_card(&summary.failed.to_string(), "Failed", "fail"));
        output.push_str(&Self::stat_card(
            &format!("{}s", format_duration(summary.duration_ms)),
            "Duration",
            "",
        ));
        output.push_str("\n        </div>");

        if !passed.is_empty() {
            output.push_str(&Self::format_section("✅ Passed Tests", &passed, true));
        }
        if !failed.is_empty() {
            output.push_str(&Self::format_section("❌ Failed Tests", &failed, false));
        }

        output.push_str("\n    </div>\n</body>\n</html>\n");
        output
    }

    fn file_extension(&self) -> &'static str {
        OutputFormat::Html.extension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::formatter::fixtures::{empty_run, sample_run};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_html_report() {
        let report = HtmlReporter.render(&sample_run());

        assert!(report.starts_with("<!DOCTYPE html>"));
        assert!(report.trim_end().ends_with("</html>"));
        assert!(report.contains("Generated: 2024-01-01 12:00:01 UTC"));
        assert!(report.contains("Passed (33.3%)"));
        assert!(report.contains("1.23s"));
        assert!(report.contains("JSON &lt;Schema&gt;"));
        assert!(!report.contains("JSON <Schema>"));
        assert!(report.contains(r#"<div class="error">Error: Model call timed out after 30000ms</div>"#));
        assert!(report.contains(r#"<div class="assertion fail">• Response is not valid JSON</div>"#));
    }

    #[test]
    fn test_html_empty_run() {
        let report = HtmlReporter.render(&empty_run());
        assert!(report.contains("Passed (0.0%)"));
        assert!(!report.contains("section-title\">"));
    }
}
