//! Element lookup strategies
//!
//! Each strategy is one stateless algorithm for turning a selector into an element
//! reference against a session. Strategies are evaluated in a fixed priority order
//! with early return; the order favors stable identifiers over brittle text
//! matches, and exact text over partial/image matches.

use async_trait::async_trait;
use std::sync::Arc;

use crate::device::DeviceSession;
use crate::{Error, Result};

/// Outcome of one strategy invocation
///
/// `Errored` is treated identically to `NotFound` by control flow but is logged
/// distinctly with its cause.
pub enum FindAttempt {
    Found(String),
    NotFound,
    Errored(Error),
}

impl FindAttempt {
    fn from_lookup(result: Result<Option<String>>) -> Self {
        match result {
            Ok(Some(element_ref)) => FindAttempt::Found(element_ref),
            Ok(None) => FindAttempt::NotFound,
            Err(e) => FindAttempt::Errored(e),
        }
    }
}

/// One element lookup strategy
#[async_trait]
pub trait FindStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Whether this strategy can interpret the selector at all
    fn applies(&self, _selector: &str) -> bool {
        true
    }

    /// Attempt to resolve the selector against the session
    async fn attempt(&self, session: &Arc<dyn DeviceSession>, selector: &str) -> FindAttempt;
}

/// Lookup by accessibility/resource identifier
pub struct ByIdentifier;

#[async_trait]
impl FindStrategy for ByIdentifier {
    fn name(&self) -> &'static str {
        "id"
    }

    async fn attempt(&self, session: &Arc<dyn DeviceSession>, selector: &str) -> FindAttempt {
        FindAttempt::from_lookup(session.find_element("id", selector).await)
    }
}

/// Lookup by exact text content
pub struct ByExactText;

#[async_trait]
impl FindStrategy for ByExactText {
    fn name(&self) -> &'static str {
        "text"
    }

    async fn attempt(&self, session: &Arc<dyn DeviceSession>, selector: &str) -> FindAttempt {
        FindAttempt::from_lookup(session.find_element("text", selector).await)
    }
}

/// Lookup by image template
///
/// Only applies when the selector looks like an image file. The matching
/// algorithm itself lives behind the driver; absent a matcher the lookup simply
/// reports not-found.
pub struct ByImage;

#[async_trait]
impl FindStrategy for ByImage {
    fn name(&self) -> &'static str {
        "image"
    }

    fn applies(&self, selector: &str) -> bool {
        selector.ends_with(".png") || selector.ends_with(".jpg")
    }

    async fn attempt(&self, session: &Arc<dyn DeviceSession>, selector: &str) -> FindAttempt {
        FindAttempt::from_lookup(session.find_element_by_image(selector).await)
    }
}

/// Lookup by partial text match
pub struct ByPartialText;

#[async_trait]
impl FindStrategy for ByPartialText {
    fn name(&self) -> &'static str {
        "partial-text"
    }

    async fn attempt(&self, session: &Arc<dyn DeviceSession>, selector: &str) -> FindAttempt {
        FindAttempt::from_lookup(session.find_element("partial-text", selector).await)
    }
}

/// Default strategy list in priority order
pub fn default_strategies() -> Vec<Box<dyn FindStrategy>> {
    vec![
        Box::new(ByIdentifier),
        Box::new(ByExactText),
        Box::new(ByImage),
        Box::new(ByPartialText),
    ]
}
