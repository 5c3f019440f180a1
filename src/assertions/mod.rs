//! Response assertions
//!
//! Pass/fail predicates applied to a completed model response, plus the
//! runner that evaluates a list of them in isolation.

#![allow(dead_code)]

mod basic;
mod judge;
mod runner;
mod spec;

pub use basic::{contains, is_valid_json, length_between, matches_regex, word_count};
pub use judge::{Judge, JudgePreset};
pub use runner::AssertionRunner;
pub use spec::AssertionSpec;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::AssertionOutcome;

/// Everything an assertion may inspect
#[derive(Clone, Debug, Serialize)]
pub struct AssertionContext {
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub provider: String,
}

impl AssertionContext {
    pub fn new(
        prompt: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            response: response.into(),
            model: model.into(),
            provider: provider.into(),
        }
    }
}

/// Assertion construction and evaluation errors
#[derive(Error, Debug)]
pub enum AssertionError {
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid assertion: {0}")]
    Invalid(String),

    #[error("No judge model configured for AI-judged assertion")]
    JudgeUnavailable,

    #[error("{0}")]
    Evaluation(String),
}

/// A predicate over one response
#[async_trait]
pub trait Assertion: Send + Sync {
    /// Short human-readable label
    fn describe(&self) -> String;

    async fn evaluate(&self, ctx: &AssertionContext) -> Result<AssertionOutcome, AssertionError>;
}

/// Assertion backed by a plain function
pub struct FnAssertion<F> {
    label: String,
    check: F,
}

/// Wrap a synchronous function as an assertion
pub fn assert_fn<F>(label: impl Into<String>, check: F) -> FnAssertion<F>
where
    F: Fn(&AssertionContext) -> Result<AssertionOutcome, AssertionError> + Send + Sync,
{
    FnAssertion {
        label: label.into(),
        check,
    }
}

#[async_trait]
impl<F> Assertion for FnAssertion<F>
where
    F: Fn(&AssertionContext) -> Result<AssertionOutcome, AssertionError> + Send + Sync,
{
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn evaluate(&self, ctx: &AssertionContext) -> Result<AssertionOutcome, AssertionError> {
        (self.check)(ctx)
    }
}
