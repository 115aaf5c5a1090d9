//! Test execution scheduler
//!
//! Runs named test units with per-unit retry and optional bounded-parallel
//! fan-out. Failures never escape the scheduler; exhaustion becomes a `failed`
//! result carrying the error and any diagnostic screenshot references.

use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{error, info};

use crate::config::Config;
use crate::Result;

/// Backoff between retry attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// Final status of one test unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result artifact for one test unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub screenshots: Vec<String>,
}

/// Re-callable test body
pub type TestBody = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Named test unit
#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub body: TestBody,
}

impl TestCase {
    /// Create a test case from an async closure
    pub fn new<S, F, Fut>(name: S, body: F) -> Self
    where
        S: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(move || {
                let fut: BoxFuture<'static, Result<()>> = Box::pin(body());
                fut
            }),
        }
    }
}

/// Test runner with retry logic and bounded-parallel execution
pub struct TestRunner {
    config: Arc<Config>,
}

impl TestRunner {
    /// Create a new runner
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Run a single test with retry logic
    ///
    /// Up to `retries` attempts; each failure records a conventionally named
    /// screenshot reference when the policy is on (capture itself is the test
    /// body's concern). Status is `passed` on first success, `failed` only after
    /// exhaustion.
    pub async fn run_test<F, Fut>(&self, body: F, name: &str) -> TestResult
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let retries = self.config.retries.max(1);
        let start = Instant::now();
        let mut screenshots = Vec::new();
        let mut last_error = None;

        for attempt in 0..retries {
            if attempt > 0 {
                info!("Retrying test: {} (attempt {}/{})", name, attempt + 1, retries);
            }

            match body().await {
                Ok(()) => {
                    let duration_ms = start.elapsed().as_millis() as u64;
                    info!("Test passed: {} ({}ms)", name, duration_ms);
                    return TestResult {
                        name: name.to_string(),
                        status: TestStatus::Passed,
                        duration_ms,
                        error: None,
                        screenshots,
                    };
                }
                Err(e) => {
                    error!("Test failed: {}: {}", name, e);

                    if self.config.screenshot_on_failure {
                        screenshots.push(format!(
                            "screenshot_{}_{}.png",
                            name,
                            chrono::Utc::now().timestamp_millis()
                        ));
                    }
                    last_error = Some(e.to_string());

                    if attempt + 1 < retries {
                        sleep(RETRY_BACKOFF).await;
                    }
                }
            }
        }

        TestResult {
            name: name.to_string(),
            status: TestStatus::Failed,
            duration_ms: start.elapsed().as_millis() as u64,
            error: last_error,
            screenshots,
        }
    }

    /// Run multiple tests
    ///
    /// Sequential (preserving input order) unless parallel mode is on, in which
    /// case the input is partitioned into fixed-size chunks of `max_parallel`.
    /// Chunks run one after another; units inside a chunk run concurrently, and
    /// each chunk's sub-results follow the chunk's input order.
    pub async fn run_tests(&self, tests: &[TestCase]) -> Vec<TestResult> {
        if self.config.parallel {
            self.run_tests_parallel(tests).await
        } else {
            self.run_tests_sequential(tests).await
        }
    }

    async fn run_tests_sequential(&self, tests: &[TestCase]) -> Vec<TestResult> {
        let mut results = Vec::with_capacity(tests.len());
        for test in tests {
            results.push(self.run_test(|| (test.body)(), &test.name).await);
        }
        results
    }

    async fn run_tests_parallel(&self, tests: &[TestCase]) -> Vec<TestResult> {
        let chunk_size = self.config.max_parallel.max(1);
        let mut results = Vec::with_capacity(tests.len());

        for chunk in tests.chunks(chunk_size) {
            let chunk_results = join_all(
                chunk
                    .iter()
                    .map(|test| self.run_test(|| (test.body)(), &test.name)),
            )
            .await;
            results.extend(chunk_results);
        }

        results
    }
}
