//! Automation driver traits
//!
//! Abstract interface to the external automation driver (an Appium-compatible
//! WebDriver endpoint). The resolution engine only ever talks to this boundary;
//! everything behind it is a thin transport pass-through.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::device::Platform;
use crate::Result;

/// Element rectangle as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u64,
    pub height: u64,
}

/// Automation driver trait
///
/// One implementation talks to a live driver endpoint; the mock scripts every
/// primitive for tests. Element references are opaque strings minted by the driver.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Create a driver session with the given capabilities, returning its id
    async fn create_session(&self, capabilities: Value) -> Result<String>;

    /// Delete a driver session
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// List device ids visible to the local tooling (`adb devices` / `simctl`)
    async fn list_devices(&self, platform: Platform) -> Result<Vec<String>>;

    /// Find an element by locator; `Ok(None)` on not-found, `Err` only on transport failure
    async fn find_element(
        &self,
        session_id: &str,
        using: &str,
        value: &str,
    ) -> Result<Option<String>>;

    /// Find an element by image template; `Ok(None)` when no matcher is available
    async fn find_element_by_image(
        &self,
        session_id: &str,
        image_path: &str,
    ) -> Result<Option<String>>;

    /// Activate (install-then-activate or activate-by-id) the app under test
    async fn activate_app(&self, session_id: &str, app_ref: &str) -> Result<()>;

    /// Click an element
    async fn click_element(&self, session_id: &str, element_ref: &str) -> Result<()>;

    /// Type text into an element
    async fn type_text(&self, session_id: &str, element_ref: &str, text: &str) -> Result<()>;

    /// Get element text content
    async fn element_text(&self, session_id: &str, element_ref: &str) -> Result<String>;

    /// Check whether an element is displayed
    async fn element_displayed(&self, session_id: &str, element_ref: &str) -> Result<bool>;

    /// Get element attributes; `Err` when the reference is no longer live
    async fn element_info(&self, session_id: &str, element_ref: &str) -> Result<Value>;

    /// Get element rectangle
    async fn element_rect(&self, session_id: &str, element_ref: &str) -> Result<Rect>;

    /// Scroll an element into view
    async fn scroll_to_element(&self, session_id: &str, element_ref: &str) -> Result<()>;

    /// Capture a screenshot, returned as a base64-encoded PNG
    async fn screenshot(&self, session_id: &str) -> Result<String>;

    /// Execute a driver-side script
    async fn execute_script(&self, session_id: &str, script: &str, args: Vec<Value>)
        -> Result<Value>;
}
