//! Device session traits
//!
//! Defines the capability interface one connected automation target exposes to the
//! resolution engine, plus the small value types shared across device variants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::Result;

/// Target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!("Unsupported platform: {}", other)),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

/// Session lifecycle state
///
/// Transitions only move forward: `Disconnected → Connected → Launched → Closed`.
/// `Closed` is terminal; a closed session is discarded, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Disconnected,
    Connected,
    Launched,
    Closed,
}

/// Element location on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Element dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: u64,
    pub height: u64,
}

/// Device session capability trait
///
/// One connected target (physical device, emulator/simulator, or cloud-hosted
/// device). Lifecycle operations plus the low-level element primitives the
/// element resolver builds on. At most one live underlying connection per session.
#[async_trait]
pub trait DeviceSession: Send + Sync + std::fmt::Debug {
    /// Stable session id
    fn id(&self) -> &str;

    /// Human-readable device name
    fn name(&self) -> &str;

    /// Target platform
    fn platform(&self) -> Platform;

    /// Current lifecycle state
    fn state(&self) -> SessionState;

    /// Side-effect-free availability probe
    async fn is_available(&self) -> Result<bool>;

    /// Establish the underlying driver connection
    async fn connect(&self) -> Result<()>;

    /// Terminal disconnect; subsequent operations fail
    async fn disconnect(&self) -> Result<()>;

    /// Launch the app, connecting first if necessary
    async fn launch_app(&self, app_ref: &str) -> Result<()>;

    /// Look up an element; `Ok(None)` on not-found, `Err` only on transport failure
    async fn find_element(&self, strategy: &str, selector: &str) -> Result<Option<String>>;

    /// Look up an element by image template
    async fn find_element_by_image(&self, image_path: &str) -> Result<Option<String>>;

    /// Click an element
    async fn click_element(&self, element_ref: &str) -> Result<()>;

    /// Type text into an element
    async fn type_text(&self, element_ref: &str, text: &str) -> Result<()>;

    /// Get element text content
    async fn get_element_text(&self, element_ref: &str) -> Result<String>;

    /// Check element visibility
    async fn is_element_visible(&self, element_ref: &str) -> Result<bool>;

    /// Get element attributes; fails when the reference is no longer live
    async fn get_element_info(&self, element_ref: &str) -> Result<Value>;

    /// Get element location
    async fn get_element_location(&self, element_ref: &str) -> Result<Point>;

    /// Get element size
    async fn get_element_size(&self, element_ref: &str) -> Result<Size>;

    /// Scroll an element into view
    async fn scroll_to_element(&self, element_ref: &str) -> Result<()>;

    /// Capture a screenshot, persist it, and return its path
    async fn take_screenshot(&self, name: Option<&str>) -> Result<PathBuf>;

    /// Execute a driver-side script
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;
}

/// Device resolution target
///
/// Callers may hand the resolver either an identifier string or an already-built
/// session; the latter bypasses parsing and caching entirely.
#[derive(Clone)]
pub enum DeviceTarget {
    /// Identifier string, optionally prefixed `local:` / `cloud:` / `emulator:`
    Id(String),
    /// Pre-built session, returned unchanged by the resolver
    Session(Arc<dyn DeviceSession>),
}

impl From<&str> for DeviceTarget {
    fn from(id: &str) -> Self {
        DeviceTarget::Id(id.to_string())
    }
}

impl From<String> for DeviceTarget {
    fn from(id: String) -> Self {
        DeviceTarget::Id(id)
    }
}

impl From<Arc<dyn DeviceSession>> for DeviceTarget {
    fn from(session: Arc<dyn DeviceSession>) -> Self {
        DeviceTarget::Session(session)
    }
}
