//! Data models for prompt evaluation
//!
//! This module contains all data structures used throughout the application.

#![allow(dead_code)]

mod prompt;
mod test_result;

pub use prompt::{
    ExecutionOptions, Message, PromptSpec, Role, Suite, SuiteConfig, DEFAULT_TIMEOUT_MS,
};
pub use test_result::{
    AssertionOutcome, RunConfig, RunRecord, TaskResult, TaskState,
};
