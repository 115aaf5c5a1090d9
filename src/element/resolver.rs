//! Element resolver
//!
//! Runs the multi-strategy, multi-attempt search that turns a flaky selector into
//! a live `ElementHandle`, or a diagnostic failure once the retry budget is spent.

use std::sync::Arc;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::device::DeviceSession;
use crate::element::handle::ElementHandle;
use crate::element::strategy::{default_strategies, FindAttempt, FindStrategy};
use crate::{Error, Result};

/// Backoff between attempts
const RETRY_BACKOFF: Duration = Duration::from_millis(1000);

/// Per-call overrides for the engine-level defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
}

/// Multi-strategy element resolver
pub struct ElementResolver {
    config: Arc<Config>,
    strategies: Vec<Box<dyn FindStrategy>>,
}

impl ElementResolver {
    /// Create a resolver with the default strategy list
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            strategies: default_strategies(),
        }
    }

    /// Create a resolver with a custom strategy list (priority order)
    pub fn with_strategies(config: Arc<Config>, strategies: Vec<Box<dyn FindStrategy>>) -> Self {
        Self { config, strategies }
    }

    /// Find an element by selector
    ///
    /// Strategies run strictly in priority order, never concurrently; the first
    /// strategy whose reference also passes the liveness re-check wins and all
    /// later strategies and attempts are skipped. Per-strategy faults are
    /// absorbed. Between attempts the resolver sleeps a fixed backoff, but only
    /// while the timeout budget has room; the deadline never interrupts an
    /// in-flight strategy call.
    #[instrument(skip(self, session, options))]
    pub async fn find(
        &self,
        session: &Arc<dyn DeviceSession>,
        selector: &str,
        options: FindOptions,
    ) -> Result<ElementHandle> {
        let timeout = Duration::from_millis(options.timeout_ms.unwrap_or(self.config.timeout_ms));
        let retries = options.retries.unwrap_or(self.config.retries).max(1);
        let start = Instant::now();

        debug!(
            "Finding element: {} (timeout: {:?}, retries: {})",
            selector, timeout, retries
        );

        for attempt in 0..retries {
            for strategy in &self.strategies {
                if !strategy.applies(selector) {
                    continue;
                }
                match strategy.attempt(session, selector).await {
                    FindAttempt::Found(element_ref) => {
                        let handle = ElementHandle::new(session, element_ref);
                        if handle.exists().await {
                            debug!("Found element by {}: {}", strategy.name(), selector);
                            return Ok(handle);
                        }
                        debug!(
                            "Strategy {} resolved a stale reference for {}",
                            strategy.name(),
                            selector
                        );
                    }
                    FindAttempt::NotFound => {}
                    FindAttempt::Errored(cause) => {
                        debug!(
                            "Strategy {} errored on attempt {}: {}",
                            strategy.name(),
                            attempt + 1,
                            cause
                        );
                    }
                }
            }

            // No trailing sleep after the final attempt, and none once the
            // budget is spent
            if attempt + 1 < retries && start.elapsed() < timeout {
                sleep(RETRY_BACKOFF).await;
            }
        }

        let screenshot = if self.config.screenshot_on_failure {
            let name = format!(
                "element_not_found_{}.png",
                chrono::Utc::now().timestamp_millis()
            );
            match session.take_screenshot(Some(&name)).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failed to capture diagnostic screenshot: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Err(Error::element_not_found(selector, retries, screenshot))
    }
}
