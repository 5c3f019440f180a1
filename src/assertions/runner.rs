//! Assertion runner
//!
//! Evaluates every assertion of a task against the same response. A failing
//! or panicking assertion becomes a failing outcome in its own slot.

use futures::future::join_all;
use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::warn;

use super::{Assertion, AssertionContext};
use crate::models::AssertionOutcome;
use crate::utils::panic_message;

#[derive(Clone, Debug, Default)]
pub struct AssertionRunner;

impl AssertionRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run one assertion, converting errors and panics into outcomes
    pub async fn run_assertion(
        &self,
        assertion: &dyn Assertion,
        ctx: &AssertionContext,
    ) -> AssertionOutcome {
        match AssertUnwindSafe(assertion.evaluate(ctx)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!("Assertion '{}' errored: {}", assertion.describe(), e);
                AssertionOutcome::fail(format!("Assertion failed with error: {e}"))
                    .with_details(json!({ "error": e.to_string() }))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!("Assertion '{}' panicked: {}", assertion.describe(), reason);
                AssertionOutcome::fail(format!("Assertion failed with error: {reason}"))
                    .with_details(json!({ "error": reason, "panicked": true }))
            }
        }
    }

    /// Outcomes come back in input order, one per assertion
    pub async fn run_assertions(
        &self,
        assertions: &[Arc<dyn Assertion>],
        ctx: &AssertionContext,
    ) -> Vec<AssertionOutcome> {
        join_all(
            assertions
                .iter()
                .map(|assertion| self.run_assertion(assertion.as_ref(), ctx)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::{assert_fn, contains, AssertionError};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Slow {
        delay_ms: u64,
        label: &'static str,
    }

    #[async_trait]
    impl Assertion for Slow {
        fn describe(&self) -> String {
            self.label.to_string()
        }

        async fn evaluate(
            &self,
            _ctx: &AssertionContext,
        ) -> Result<AssertionOutcome, AssertionError> {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(AssertionOutcome::pass(self.label))
        }
    }

    fn ctx() -> AssertionContext {
        AssertionContext::new("prompt", "def factorial(n): ...", "m", "p")
    }

    #[tokio::test]
    async fn test_errors_and_panics_are_isolated() {
        let assertions: Vec<Arc<dyn Assertion>> = vec![
            Arc::new(contains("factorial", false)),
            Arc::new(assert_fn("throws", |_| {
                Err(AssertionError::Evaluation("kaboom".to_string()))
            })),
            Arc::new(assert_fn("panics", |_| panic!("bad assertion"))),
            Arc::new(contains("fib", false)),
        ];

        let outcomes = AssertionRunner::new().run_assertions(&assertions, &ctx()).await;

        assert_eq!(outcomes.len(), assertions.len());
        assert!(outcomes[0].passed);
        assert!(!outcomes[1].passed);
        assert!(outcomes[1].message.contains("kaboom"));
        assert!(outcomes[1].details.is_some());
        assert!(!outcomes[2].passed);
        assert!(outcomes[2].message.contains("bad assertion"));
        assert!(!outcomes[3].passed);
    }

    #[tokio::test]
    async fn test_output_order_ignores_completion_order() {
        let assertions: Vec<Arc<dyn Assertion>> = vec![
            Arc::new(Slow {
                delay_ms: 40,
                label: "first",
            }),
            Arc::new(Slow {
                delay_ms: 1,
                label: "second",
            }),
        ];

        let outcomes = AssertionRunner::new().run_assertions(&assertions, &ctx()).await;
        let messages: Vec<_> = outcomes.iter().map(|o| o.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_assertion_list() {
        let outcomes = AssertionRunner::new().run_assertions(&[], &ctx()).await;
        assert!(outcomes.is_empty());
    }
}
