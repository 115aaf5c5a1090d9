//! Integration tests for the test execution scheduler

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::config::Config;
use crate::runner::scheduler::{TestCase, TestRunner, TestStatus};
use crate::Error;

fn runner_with(retries: u32, parallel: bool, max_parallel: usize) -> TestRunner {
    TestRunner::new(Arc::new(Config {
        retries,
        parallel,
        max_parallel,
        ..Config::default()
    }))
}

#[tokio::test]
async fn test_pass_on_first_attempt() {
    let runner = runner_with(3, false, 5);

    let result = runner.run_test(|| async { Ok(()) }, "smoke").await;

    assert_eq!(result.name, "smoke");
    assert_eq!(result.status, TestStatus::Passed);
    assert!(result.error.is_none());
    assert!(result.screenshots.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_records_screenshot_per_failure() {
    let runner = runner_with(3, false, 5);

    let start = Instant::now();
    let result = runner
        .run_test(
            || async { Err(Error::internal("always broken")) },
            "flaky",
        )
        .await;

    assert_eq!(result.status, TestStatus::Failed);
    assert_eq!(result.screenshots.len(), 3);
    assert!(result
        .screenshots
        .iter()
        .all(|s| s.starts_with("screenshot_flaky_")));
    assert_eq!(result.error.as_deref(), Some("Internal error: always broken"));
    // Two backoff sleeps, none after the final attempt
    assert_eq!(start.elapsed().as_millis(), 2000);
}

#[tokio::test(start_paused = true)]
async fn test_pass_on_second_attempt() {
    let runner = runner_with(3, false, 5);
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_body = calls.clone();
    let result = runner
        .run_test(
            move || {
                let calls = calls_body.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(Error::internal("first attempt flakes"))
                    } else {
                        Ok(())
                    }
                }
            },
            "eventually-green",
        )
        .await;

    assert_eq!(result.status, TestStatus::Passed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // The failing first attempt still recorded its screenshot reference
    assert_eq!(result.screenshots.len(), 1);
}

#[tokio::test]
async fn test_screenshot_policy_off() {
    let runner = TestRunner::new(Arc::new(Config {
        retries: 2,
        screenshot_on_failure: false,
        ..Config::default()
    }));

    let result = runner
        .run_test(|| async { Err(Error::internal("broken")) }, "quiet")
        .await;

    assert_eq!(result.status, TestStatus::Failed);
    assert!(result.screenshots.is_empty());
}

#[tokio::test]
async fn test_sequential_preserves_input_order() {
    let runner = runner_with(1, false, 5);

    let cases = vec![
        TestCase::new("first", || async { Ok(()) }),
        TestCase::new("second", || async { Err(Error::internal("broken")) }),
        TestCase::new("third", || async { Ok(()) }),
    ];

    let results = runner.run_tests(&cases).await;

    assert_eq!(results.len(), 3);
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(results[0].status, TestStatus::Passed);
    assert_eq!(results[1].status, TestStatus::Failed);
    assert_eq!(results[2].status, TestStatus::Passed);
}

#[tokio::test(start_paused = true)]
async fn test_parallel_chunks_bound_concurrency() {
    let runner = runner_with(1, true, 3);
    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));

    let cases: Vec<TestCase> = (0..7)
        .map(|i| {
            let active = active.clone();
            let max_active = max_active.clone();
            TestCase::new(format!("unit-{}", i), move || {
                let active = active.clone();
                let max_active = max_active.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        })
        .collect();

    let results = runner.run_tests(&cases).await;

    // ceil(7/3) = 3 chunks, all units accounted for in input order
    assert_eq!(results.len(), 7);
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["unit-0", "unit-1", "unit-2", "unit-3", "unit-4", "unit-5", "unit-6"]
    );
    // Within a chunk units overlap; across chunks they never do
    assert!(max_active.load(Ordering::SeqCst) <= 3);
    assert!(max_active.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_failures_never_escape_the_scheduler() {
    let runner = runner_with(1, true, 2);

    let cases = vec![
        TestCase::new("red", || async { Err(Error::internal("broken")) }),
        TestCase::new("green", || async { Ok(()) }),
    ];

    let results = runner.run_tests(&cases).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, TestStatus::Failed);
    assert_eq!(results[1].status, TestStatus::Passed);
}

#[test]
fn test_result_serialization() {
    let result = crate::runner::TestResult {
        name: "smoke".to_string(),
        status: TestStatus::Passed,
        duration_ms: 42,
        error: None,
        screenshots: vec![],
    };

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "passed");
    assert_eq!(json["duration_ms"], 42);
    assert!(json.get("error").is_none());
}
