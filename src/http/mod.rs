//! HTTP client module
//!
//! Provides the JSON HTTP client used by model providers.

mod client;

pub use client::{HttpClient, HttpError};
