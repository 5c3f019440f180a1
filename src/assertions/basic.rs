//! Basic response checks
//!
//! Pure, total functions of the response text. None of them fail at
//! evaluation time; regex compilation happens when the check is built.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::borrow::Cow;

use super::{Assertion, AssertionContext, AssertionError};
use crate::models::AssertionOutcome;

/// Built-in response check
#[derive(Clone, Debug)]
pub enum Check {
    Contains { text: String, case_sensitive: bool },
    NotContains { text: String, case_sensitive: bool },
    MatchesRegex(Regex),
    LengthBetween { min: usize, max: usize },
    StartsWith { text: String, case_sensitive: bool },
    EndsWith { text: String, case_sensitive: bool },
    ValidJson,
    WordCount { min: usize, max: Option<usize> },
}

pub fn contains(text: impl Into<String>, case_sensitive: bool) -> Check {
    Check::Contains {
        text: text.into(),
        case_sensitive,
    }
}

pub fn not_contains(text: impl Into<String>, case_sensitive: bool) -> Check {
    Check::NotContains {
        text: text.into(),
        case_sensitive,
    }
}

/// Fails on a malformed pattern
pub fn matches_regex(pattern: &str) -> Result<Check, AssertionError> {
    Ok(Check::MatchesRegex(Regex::new(pattern)?))
}

pub fn length_between(min: usize, max: usize) -> Check {
    Check::LengthBetween { min, max }
}

pub fn starts_with(text: impl Into<String>, case_sensitive: bool) -> Check {
    Check::StartsWith {
        text: text.into(),
        case_sensitive,
    }
}

pub fn ends_with(text: impl Into<String>, case_sensitive: bool) -> Check {
    Check::EndsWith {
        text: text.into(),
        case_sensitive,
    }
}

pub fn is_valid_json() -> Check {
    Check::ValidJson
}

pub fn word_count(min: usize, max: Option<usize>) -> Check {
    Check::WordCount { min, max }
}

fn fold(s: &str, case_sensitive: bool) -> Cow<'_, str> {
    if case_sensitive {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.to_lowercase())
    }
}

impl Check {
    /// Evaluate against a response
    pub fn check(&self, response: &str) -> AssertionOutcome {
        match self {
            Check::Contains {
                text,
                case_sensitive,
            } => {
                let passed = fold(response, *case_sensitive).contains(&*fold(text, *case_sensitive));
                AssertionOutcome::from_check(
                    passed,
                    format!("Response contains expected text: \"{text}\""),
                    format!("Response does not contain expected text: \"{text}\""),
                )
                .with_details(json!({ "expected_text": text, "case_sensitive": case_sensitive }))
            }
            Check::NotContains {
                text,
                case_sensitive,
            } => {
                let passed =
                    !fold(response, *case_sensitive).contains(&*fold(text, *case_sensitive));
                AssertionOutcome::from_check(
                    passed,
                    format!("Response correctly does not contain: \"{text}\""),
                    format!("Response incorrectly contains: \"{text}\""),
                )
                .with_details(json!({ "unexpected_text": text, "case_sensitive": case_sensitive }))
            }
            Check::MatchesRegex(pattern) => {
                let passed = pattern.is_match(response);
                AssertionOutcome::from_check(
                    passed,
                    format!("Response matches regex pattern: /{}/", pattern.as_str()),
                    format!("Response does not match regex pattern: /{}/", pattern.as_str()),
                )
                .with_details(json!({ "pattern": pattern.as_str() }))
            }
            Check::LengthBetween { min, max } => {
                let length = response.chars().count();
                let passed = length >= *min && length <= *max;
                AssertionOutcome::from_check(
                    passed,
                    format!("Response length ({length}) is within expected range ({min}-{max})"),
                    format!("Response length ({length}) is outside expected range ({min}-{max})"),
                )
                .with_details(json!({ "actual_length": length, "min_length": min, "max_length": max }))
            }
            Check::StartsWith {
                text,
                case_sensitive,
            } => {
                let passed =
                    fold(response, *case_sensitive).starts_with(&*fold(text, *case_sensitive));
                AssertionOutcome::from_check(
                    passed,
                    format!("Response starts with: \"{text}\""),
                    format!("Response does not start with: \"{text}\""),
                )
                .with_details(json!({ "expected_start": text, "case_sensitive": case_sensitive }))
            }
            Check::EndsWith {
                text,
                case_sensitive,
            } => {
                let passed =
                    fold(response, *case_sensitive).ends_with(&*fold(text, *case_sensitive));
                AssertionOutcome::from_check(
                    passed,
                    format!("Response ends with: \"{text}\""),
                    format!("Response does not end with: \"{text}\""),
                )
                .with_details(json!({ "expected_end": text, "case_sensitive": case_sensitive }))
            }
            Check::ValidJson => match serde_json::from_str::<serde_json::Value>(response) {
                Ok(_) => AssertionOutcome::pass("Response is valid JSON")
                    .with_details(json!({ "parsed_successfully": true })),
                Err(e) => AssertionOutcome::fail(format!("Response is not valid JSON: {e}"))
                    .with_details(json!({
                        "error": e.to_string(),
                        "line": e.line(),
                        "column": e.column(),
                    })),
            },
            Check::WordCount { min, max } => {
                let count = response.split_whitespace().count();
                let passed = count >= *min && max.map_or(true, |max| count <= max);
                let range = match max {
                    Some(max) => format!("{min}-{max}"),
                    None => format!("at least {min}"),
                };
                AssertionOutcome::from_check(
                    passed,
                    format!("Response word count ({count}) is within expected range ({range})"),
                    format!("Response word count ({count}) is outside expected range ({range})"),
                )
                .with_details(json!({ "actual_word_count": count, "min_words": min, "max_words": max }))
            }
        }
    }
}

#[async_trait]
impl Assertion for Check {
    fn describe(&self) -> String {
        match self {
            Check::Contains { text, .. } => format!("contains \"{text}\""),
            Check::NotContains { text, .. } => format!("does not contain \"{text}\""),
            Check::MatchesRegex(pattern) => format!("matches /{}/", pattern.as_str()),
            Check::LengthBetween { min, max } => format!("length {min}-{max}"),
            Check::StartsWith { text, .. } => format!("starts with \"{text}\""),
            Check::EndsWith { text, .. } => format!("ends with \"{text}\""),
            Check::ValidJson => "valid JSON".to_string(),
            Check::WordCount { min, max: Some(max) } => format!("word count {min}-{max}"),
            Check::WordCount { min, max: None } => format!("word count >= {min}"),
        }
    }

    async fn evaluate(&self, ctx: &AssertionContext) -> Result<AssertionOutcome, AssertionError> {
        Ok(self.check(&ctx.response))
    }
}
