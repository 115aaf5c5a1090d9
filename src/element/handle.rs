//! Element handle
//!
//! Lightweight wrapper binding an opaque element reference to the session that
//! produced it. Holds only a weak back-reference; a handle is good for a single
//! test step and is never cached.

use serde_json::Value;
use std::sync::{Arc, Weak};

use crate::device::{DeviceSession, Point, Size};
use crate::{Error, Result};

/// Handle to one resolved on-screen element
#[derive(Clone, Debug)]
pub struct ElementHandle {
    element_ref: String,
    session: Weak<dyn DeviceSession>,
}

impl ElementHandle {
    /// Bind an opaque element reference to its owning session
    pub fn new(session: &Arc<dyn DeviceSession>, element_ref: String) -> Self {
        Self {
            element_ref,
            session: Arc::downgrade(session),
        }
    }

    /// Opaque reference as minted by the driver
    pub fn element_ref(&self) -> &str {
        &self.element_ref
    }

    fn session(&self) -> Result<Arc<dyn DeviceSession>> {
        self.session
            .upgrade()
            .ok_or_else(|| Error::session_closed("owning session dropped"))
    }

    /// Click the element
    pub async fn click(&self) -> Result<()> {
        self.session()?.click_element(&self.element_ref).await
    }

    /// Type text into the element
    pub async fn type_text(&self, text: &str) -> Result<()> {
        self.session()?.type_text(&self.element_ref, text).await
    }

    /// Get the element's text content
    pub async fn text(&self) -> Result<String> {
        self.session()?.get_element_text(&self.element_ref).await
    }

    /// Check whether the element is visible
    pub async fn is_visible(&self) -> Result<bool> {
        self.session()?.is_element_visible(&self.element_ref).await
    }

    /// Liveness re-check: does the session still report this reference?
    pub async fn exists(&self) -> bool {
        match self.session() {
            Ok(session) => session.get_element_info(&self.element_ref).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Get element attributes
    pub async fn info(&self) -> Result<Value> {
        self.session()?.get_element_info(&self.element_ref).await
    }

    /// Get element location
    pub async fn location(&self) -> Result<Point> {
        self.session()?
            .get_element_location(&self.element_ref)
            .await
    }

    /// Get element size
    pub async fn size(&self) -> Result<Size> {
        self.session()?.get_element_size(&self.element_ref).await
    }

    /// Scroll the element into view
    pub async fn scroll_into_view(&self) -> Result<()> {
        self.session()?.scroll_to_element(&self.element_ref).await
    }
}
