//! Test execution engine
//!
//! Expands suites into tasks and runs them sequentially or in parallel.

#![allow(dead_code)]

mod parallel;
mod plan;
mod runner;

pub use runner::TestEngine;
