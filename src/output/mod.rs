//! Output formatting module
//!
//! Provides the report formats for finished runs.

mod formatter;
mod html;
mod markdown;

pub use formatter::{report_path, reporter_for, write_report_to_file, OutputFormat};
use html::HtmlReporter;
use markdown::MarkdownReporter;
