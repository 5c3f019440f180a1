//! Test suites
//!
//! Built-in suites, suite files and name-based selection.

mod code_generation;
mod creative_writing;
mod file;

pub use file::SuiteFile;

use anyhow::Result;
use std::sync::Arc;

use crate::assertions::{AssertionError, Judge};
use crate::models::Suite;

/// The suites shipped with the tool. AI-judged checks are only added when a
/// judge model is available.
pub fn builtin(judge: Option<&Arc<Judge>>) -> Result<Vec<Suite>, AssertionError> {
    Ok(vec![
        creative_writing::suite(judge)?,
        code_generation::suite(judge)?,
    ])
}

/// Keep the suites named in `names`, in suite order; no names keeps all
pub fn select(suites: Vec<Suite>, names: &[String]) -> Result<Vec<Suite>> {
    if names.is_empty() {
        return Ok(suites);
    }

    let available: Vec<String> = suites.iter().map(|s| s.name.clone()).collect();
    let selected: Vec<Suite> = suites
        .into_iter()
        .filter(|s| names.iter().any(|n| n.eq_ignore_ascii_case(&s.name)))
        .collect();

    if selected.is_empty() {
        anyhow::bail!(
            "No matching test suites found. Available suites: {}",
            available.join(", ")
        );
    }
    Ok(selected)
}
