//! Test execution engine
//!
//! Executes tasks (model call, then assertions), suites (sequential or
//! parallel) and whole runs. Every failure below the run level ends up as
//! data in a [`TaskResult`]; nothing here returns an error.

use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::parallel::TaskGroup;
use super::plan::{expand_suite, Task};
use crate::assertions::{AssertionContext, AssertionRunner};
use crate::gateway::{generate_with_timeout, GatewayError, LanguageModel, ProviderRegistry};
use crate::models::{
    ExecutionOptions, PromptSpec, RunConfig, RunRecord, Suite, TaskResult, TaskState,
    DEFAULT_TIMEOUT_MS,
};
use crate::utils::panic_message;
use crate::utils::timer::{SuiteTimings, Timer};

/// Prompt evaluation engine
#[derive(Clone)]
pub struct TestEngine {
    registry: Arc<ProviderRegistry>,
    assertions: AssertionRunner,
}

impl TestEngine {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            assertions: AssertionRunner::new(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Call the model once, returning the text and elapsed milliseconds
    pub async fn execute_prompt(
        &self,
        model: &dyn LanguageModel,
        prompt: &PromptSpec,
        timeout: Duration,
    ) -> Result<(String, u64), GatewayError> {
        let timer = Timer::start(format!("prompt {}", prompt.id));
        let response = generate_with_timeout(model, &prompt.prompt, &prompt.context, timeout).await?;
        Ok((response, timer.stop()))
    }

    /// Run one task to a result; never fails
    pub async fn test_prompt(&self, task: &Task, timeout: Duration) -> TaskResult {
        let started_at = Utc::now();
        let prompt = task.prompt.as_ref();
        debug!("{} {}", TaskState::Running, task);

        let model = match self.registry.resolve(&task.provider, &task.model) {
            Ok(model) => model,
            Err(e) => {
                error!("Cannot resolve {}/{}: {}", task.provider, task.model, e);
                return TaskResult::failed(prompt, &task.provider, &task.model, e.to_string(), started_at);
            }
        };

        let (response, response_time_ms) =
            match self.execute_prompt(model.as_ref(), prompt, timeout).await {
                Ok(done) => done,
                Err(e) if e.is_timeout() => {
                    warn!("{} timed out after {}ms", task, timeout.as_millis());
                    return TaskResult::failed(prompt, &task.provider, &task.model, e.to_string(), started_at);
                }
                Err(e) => {
                    error!("{} failed: {}", task, e);
                    return TaskResult::failed(prompt, &task.provider, &task.model, e.to_string(), started_at);
                }
            };

        let ctx = AssertionContext::new(&prompt.prompt, &response, &task.model, &task.provider);
        let outcomes = self.assertions.run_assertions(&task.assertions, &ctx).await;

        TaskResult::completed(
            prompt,
            &task.provider,
            &task.model,
            response,
            response_time_ms,
            outcomes,
            started_at,
        )
    }

    /// Run every task of a suite; results follow task-matrix order
    pub async fn run_suite(&self, suite: &Suite, options: &ExecutionOptions) -> Vec<TaskResult> {
        let tasks = expand_suite(suite, options, &self.registry);
        let timeout = Duration::from_millis(options.effective_timeout_ms(&suite.config));
        let parallel = options.effective_parallel(&suite.config);

        info!(
            "Suite '{}': {} tasks ({}, timeout {}ms)",
            suite.name,
            tasks.len(),
            if parallel { "parallel" } else { "sequential" },
            timeout.as_millis()
        );

        if parallel {
            self.run_parallel(tasks, timeout, options).await
        } else {
            self.run_sequential(tasks, timeout, options).await
        }
    }

    async fn run_sequential(
        &self,
        tasks: Vec<Task>,
        timeout: Duration,
        options: &ExecutionOptions,
    ) -> Vec<TaskResult> {
        let mut results = Vec::with_capacity(tasks.len());

        for task in &tasks {
            let result = match AssertUnwindSafe(self.test_prompt(task, timeout))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!("{} aborted: {}", task, reason);
                    TaskResult::failed(
                        &task.prompt,
                        &task.provider,
                        &task.model,
                        format!("Task aborted: panicked with message \"{reason}\""),
                        Utc::now(),
                    )
                }
            };
            report_progress(&result, options.verbose);
            results.push(result);
        }

        results
    }

    async fn run_parallel(
        &self,
        tasks: Vec<Task>,
        timeout: Duration,
        options: &ExecutionOptions,
    ) -> Vec<TaskResult> {
        let mut group = TaskGroup::with_limit(options.max_concurrency);

        for task in tasks.iter().cloned() {
            let engine = self.clone();
            group.spawn(async move { engine.test_prompt(&task, timeout).await });
        }

        let joined = group.join_all().await;
        let results: Vec<TaskResult> = tasks
            .iter()
            .zip(joined)
            .map(|(task, outcome)| {
                outcome.unwrap_or_else(|e| {
                    error!("{} aborted: {}", task, e);
                    TaskResult::failed(
                        &task.prompt,
                        &task.provider,
                        &task.model,
                        format!("Task aborted: {e}"),
                        Utc::now(),
                    )
                })
            })
            .collect();

        for result in &results {
            report_progress(result, options.verbose);
        }

        results
    }

    /// Run suites one after another and aggregate into a run record
    pub async fn run_suites(&self, suites: &[Suite], options: &ExecutionOptions) -> RunRecord {
        let start_time = Utc::now();
        let mut timings = SuiteTimings::new();
        let mut results = Vec::new();

        for suite in suites {
            if options.verbose {
                info!("Running test suite: {}", suite.name);
            }
            results.extend(self.run_suite(suite, options).await);
            timings.finish(&suite.name);
        }

        let end_time = Utc::now();
        debug!(
            "{} suite(s) in {}ms:\n{}",
            timings.suites().len(),
            timings.total().as_millis(),
            timings.summary()
        );

        let config = RunConfig {
            providers: options
                .providers
                .clone()
                .unwrap_or_else(|| self.registry.provider_names()),
            // true when any suite fanned out, whether via options or its own config
            parallel: options
                .parallel
                .unwrap_or_else(|| suites.iter().any(|s| options.effective_parallel(&s.config))),
            timeout_ms: options.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        };

        let record = RunRecord::new(
            suites.iter().map(|s| s.name.clone()).collect(),
            results,
            start_time,
            end_time,
            config,
        );

        info!(
            "Run {} completed in {}ms - Pass: {}/{} ({:.1}%)",
            record.id,
            record.summary.duration_ms,
            record.summary.passed,
            record.summary.total,
            record.summary.pass_rate()
        );

        record
    }
}

fn report_progress(result: &TaskResult, verbose: bool) {
    let state = result.state();
    if verbose {
        info!("{} {}", state, result);
    } else {
        debug!("{} {}", state, result);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::assertions::{assert_fn, contains, word_count, AssertionError};
    use crate::gateway::ProviderEntry;
    use crate::models::{Message, PromptSpec};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies after a fixed delay, echoing the prompt
    struct Scripted {
        delay_ms: u64,
        reply: Option<String>,
        seen_context: Mutex<Vec<usize>>,
    }

    impl Scripted {
        fn replying(reply: &str, delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                delay_ms,
                reply: Some(reply.to_string()),
                seen_context: Mutex::new(Vec::new()),
            })
        }

        fn echo(delay_ms: u64) -> Arc<Self> {
            Arc::new(Self {
                delay_ms,
                reply: None,
                seen_context: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn generate(&self, prompt: &str, context: &[Message]) -> Result<String, GatewayError> {
            self.seen_context.lock().unwrap().push(context.len());
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(self.reply.clone().unwrap_or_else(|| prompt.to_string()))
        }
    }

    struct Broken;

    #[async_trait]
    impl LanguageModel for Broken {
        async fn generate(&self, _prompt: &str, _context: &[Message]) -> Result<String, GatewayError> {
            Err(GatewayError::Provider("503 Service Unavailable".to_string()))
        }
    }

    struct Panicking;

    #[async_trait]
    impl LanguageModel for Panicking {
        async fn generate(&self, _prompt: &str, _context: &[Message]) -> Result<String, GatewayError> {
            panic!("provider bug")
        }
    }

    fn engine_with(entries: Vec<ProviderEntry>) -> TestEngine {
        let registry = entries
            .into_iter()
            .fold(ProviderRegistry::new(), |r, e| r.with_provider(e));
        TestEngine::new(Arc::new(registry))
    }

    fn single_task(prompt: PromptSpec, provider: &str, model: &str) -> Task {
        let assertions = prompt.assertions.iter().cloned().collect();
        Task {
            index: 0,
            prompt: Arc::new(prompt),
            provider: provider.to_string(),
            model: model.to_string(),
            assertions,
        }
    }

    #[tokio::test]
    async fn test_prompt_success_runs_assertions() {
        let model = Scripted::replying("def factorial(n): return 1", 1);
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", model.clone())
        ]);
        let prompt = PromptSpec::new("fact", "Factorial", "Write factorial")
            .with_message(Message::system("You write Python"))
            .assert(contains("factorial", false))
            .assert(contains("fib", false));

        let result = engine
            .test_prompt(&single_task(prompt, "openai", "gpt"), Duration::from_secs(1))
            .await;

        assert!(result.error.is_none());
        assert_eq!(result.response, "def factorial(n): return 1");
        assert_eq!(result.assertions.len(), 2);
        assert!(result.assertions[0].passed);
        assert!(!result.assertions[1].passed);
        assert!(!result.passed);
        assert_eq!(*model.seen_context.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_unknown_model_becomes_failed_result() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0))
        ]);
        let prompt = PromptSpec::new("p", "P", "hi").assert(contains("hi", false));

        let result = engine
            .test_prompt(&single_task(prompt, "openai", "nope"), Duration::from_secs(1))
            .await;

        assert!(!result.passed);
        assert!(result.response.is_empty());
        assert!(result.assertions.is_empty());
        assert!(!result.error.as_deref().unwrap_or("").is_empty());
        assert_eq!(result.state(), TaskState::Failed);
    }

    #[tokio::test]
    async fn test_model_failure_is_preserved_verbatim() {
        let engine = engine_with(vec![
            ProviderEntry::new("google", "Google", "g").with_model("g", Arc::new(Broken))
        ]);
        let result = engine
            .test_prompt(
                &single_task(PromptSpec::new("p", "P", "hi"), "google", "g"),
                Duration::from_secs(1),
            )
            .await;

        assert!(!result.passed);
        assert_eq!(
            result.error.as_deref(),
            Some("Provider error: 503 Service Unavailable")
        );
    }

    #[tokio::test]
    async fn test_timeout_becomes_failed_result() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "slow").with_model("slow", Scripted::echo(500))
        ]);
        let result = engine
            .test_prompt(
                &single_task(PromptSpec::new("p", "P", "hi"), "openai", "slow"),
                Duration::from_millis(20),
            )
            .await;

        assert!(!result.passed);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_no_assertions_passes() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0))
        ]);
        let result = engine
            .test_prompt(
                &single_task(PromptSpec::new("p", "P", "hi"), "openai", "gpt"),
                Duration::from_secs(1),
            )
            .await;
        assert!(result.passed);
        assert!(result.assertions.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_suite_keeps_matrix_order() {
        let engine = engine_with(vec![ProviderEntry::new("openai", "OpenAI", "slow")
            .with_model("slow", Scripted::replying("slow", 50))
            .with_model("fast", Scripted::replying("fast", 5))]);

        let suite = Suite::new("Ordering").with_parallel(true).with_prompt(
            PromptSpec::new("p", "P", "hi").with_models("openai", ["slow", "fast"]),
        );

        let results = engine.run_suite(&suite, &ExecutionOptions::new()).await;
        let models: Vec<_> = results.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["slow", "fast"]);
        assert_eq!(results[0].response, "slow");
        assert_eq!(results[1].response, "fast");
    }

    #[tokio::test]
    async fn test_parallel_bounded_suite_keeps_matrix_order() {
        let engine = engine_with(vec![ProviderEntry::new("openai", "OpenAI", "a")
            .with_model("a", Scripted::replying("a", 30))
            .with_model("b", Scripted::replying("b", 1))
            .with_model("c", Scripted::replying("c", 15))]);

        let suite = Suite::new("Bounded").with_prompt(
            PromptSpec::new("p", "P", "hi").with_models("openai", ["a", "b", "c"]),
        );
        let options = ExecutionOptions::new()
            .with_parallel(true)
            .with_max_concurrency(2);

        let responses: Vec<_> = engine
            .run_suite(&suite, &options)
            .await
            .into_iter()
            .map(|r| r.response)
            .collect();
        assert_eq!(responses, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_sequential_suite_isolates_failures() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0)),
            ProviderEntry::new("google", "Google", "g").with_model("g", Arc::new(Broken)),
        ]);
        let suite = Suite::new("Mixed").with_prompt(
            PromptSpec::new("p", "P", "one two three")
                .assert(word_count(3, Some(3)))
                .assert(assert_fn("throws", |_| {
                    Err(AssertionError::Evaluation("broken check".to_string()))
                })),
        );

        let results = engine
            .run_suite(&suite, &ExecutionOptions::new().with_parallel(false))
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].provider, "openai");
        assert_eq!(results[0].assertions.len(), 2);
        assert!(results[0].assertions[0].passed);
        assert!(!results[0].assertions[1].passed);
        assert_eq!(results[1].provider, "google");
        assert!(results[1].error.is_some());
    }

    #[tokio::test]
    async fn test_panicking_model_fails_its_task_in_both_modes() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0)),
            ProviderEntry::new("google", "Google", "g").with_model("g", Arc::new(Panicking)),
        ]);
        let suite = Suite::new("Fragile")
            .with_prompt(PromptSpec::new("p", "P", "hello").assert(contains("hello", true)));

        for parallel in [false, true] {
            let record = engine
                .run_suites(
                    std::slice::from_ref(&suite),
                    &ExecutionOptions::new().with_parallel(parallel),
                )
                .await;

            assert_eq!(record.summary.total, 2, "parallel={parallel}");
            assert_eq!(record.summary.passed, 1);
            assert_eq!(record.summary.failed, 1);
            assert!(record.results[0].passed);

            let crashed = &record.results[1];
            assert_eq!(crashed.provider, "google");
            assert_eq!(crashed.state(), TaskState::Failed);
            let error = crashed.error.as_deref().unwrap_or("");
            assert!(error.starts_with("Task aborted: "), "{error}");
            assert!(error.contains("provider bug"), "{error}");
        }
    }

    #[tokio::test]
    async fn test_run_config_reports_sequential_when_no_suite_fans_out() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0))
        ]);
        let suite = Suite::new("Plain").with_prompt(PromptSpec::new("a", "A", "alpha"));

        let record = engine.run_suites(&[suite], &ExecutionOptions::new()).await;
        assert!(!record.config.parallel);
    }

    #[tokio::test]
    async fn test_run_suites_aggregates_in_suite_order() {
        let engine = engine_with(vec![
            ProviderEntry::new("openai", "OpenAI", "gpt").with_model("gpt", Scripted::echo(0))
        ]);
        let first = Suite::new("First")
            .with_prompt(PromptSpec::new("a", "A", "alpha").assert(contains("alpha", true)));
        let second = Suite::new("Second")
            .with_parallel(true)
            .with_prompt(PromptSpec::new("b", "B", "beta").assert(contains("gamma", true)))
            .with_prompt(PromptSpec::new("c", "C", "gamma"));

        let record = engine
            .run_suites(&[first, second], &ExecutionOptions::new())
            .await;

        assert_eq!(record.suite_names, vec!["First", "Second"]);
        let ids: Vec<_> = record.results.iter().map(|r| r.prompt_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(record.summary.total, 3);
        assert_eq!(record.summary.passed, 2);
        assert_eq!(record.summary.failed, 1);
        assert_eq!(record.config.providers, vec!["openai"]);
        assert!(record.config.parallel);
        assert_eq!(record.config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(record.end_time >= record.start_time);
    }

    #[tokio::test]
    async fn test_run_completes_when_every_task_fails() {
        let engine = engine_with(Vec::new());
        let suite = Suite::new("Nothing")
            .with_prompt(PromptSpec::new("a", "A", "p").with_providers(["ghost"]));

        let record = engine
            .run_suites(&[suite], &ExecutionOptions::new().with_timeout_ms(100))
            .await;

        assert_eq!(record.summary.total, 1);
        assert_eq!(record.summary.failed, 1);
        assert_eq!(record.summary.passed + record.summary.failed, record.summary.total);
        assert!(record.results[0].error.as_deref().unwrap().contains("ghost"));
        assert_eq!(record.config.timeout_ms, 100);
    }

    #[tokio::test]
    async fn test_empty_run() {
        let record = engine_with(Vec::new())
            .run_suites(&[], &ExecutionOptions::new())
            .await;
        assert_eq!(record.summary.total, 0);
        assert_eq!(record.summary.passed + record.summary.failed, 0);
        assert!(record.results.is_empty());
    }
}
