//! Device session implementation
//!
//! One `RemoteSession` represents one automation target behind the driver
//! endpoint. The local/cloud/emulator variants are a closed set of tagged kinds
//! dispatched where their behavior differs (availability probing, capabilities),
//! not separate types.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::device::traits::{DeviceSession, Platform, Point, SessionState, Size};
use crate::driver::Driver;
use crate::{Error, Result};

/// Variant-specific identity of a session target
#[derive(Debug, Clone)]
pub enum SessionKind {
    /// Physical device or already-running emulator visible to local tooling
    Local { device_id: String },
    /// Cloud-hosted device behind a provider
    Cloud { name: String, provider: String },
    /// Emulator/simulator started on demand
    Emulator { name: String },
}

/// Device session backed by the remote automation driver
pub struct RemoteSession {
    id: String,
    name: String,
    kind: SessionKind,
    platform: Platform,
    config: Arc<Config>,
    driver: Arc<dyn Driver>,
    state: RwLock<SessionState>,
    driver_session: RwLock<Option<String>>,
}

impl RemoteSession {
    /// Create a session bound to a locally visible device id
    pub fn local<S: Into<String>>(device_id: S, config: Arc<Config>, driver: Arc<dyn Driver>) -> Self {
        let device_id = device_id.into();
        Self::new(
            device_id.clone(),
            device_id.clone(),
            SessionKind::Local { device_id },
            config,
            driver,
        )
    }

    /// Create a session against a cloud provider device
    pub fn cloud<S: Into<String>>(
        name: S,
        provider: S,
        config: Arc<Config>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        let name = name.into();
        Self::new(
            format!("cloud-{}", name),
            name.clone(),
            SessionKind::Cloud {
                name,
                provider: provider.into(),
            },
            config,
            driver,
        )
    }

    /// Create a session for an on-demand emulator/simulator
    pub fn emulator<S: Into<String>>(name: S, config: Arc<Config>, driver: Arc<dyn Driver>) -> Self {
        let name = name.into();
        Self::new(
            format!("emulator-{}", name),
            name.clone(),
            SessionKind::Emulator { name },
            config,
            driver,
        )
    }

    fn new(
        id: String,
        name: String,
        kind: SessionKind,
        config: Arc<Config>,
        driver: Arc<dyn Driver>,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            platform: config.platform,
            config,
            driver,
            state: RwLock::new(SessionState::Disconnected),
            driver_session: RwLock::new(None),
        }
    }

    /// Variant of this session
    pub fn kind(&self) -> &SessionKind {
        &self.kind
    }

    fn read_state(&self) -> Result<SessionState> {
        self.state
            .read()
            .map(|s| *s)
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))
    }

    fn set_state(&self, next: SessionState) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;
        *state = next;
        Ok(())
    }

    /// Driver session id, failing if closed or never connected
    fn require_session(&self) -> Result<String> {
        if self.read_state()? == SessionState::Closed {
            return Err(Error::session_closed(&self.id));
        }
        self.driver_session
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .clone()
            .ok_or_else(|| Error::connection(format!("Session not connected: {}", self.id)))
    }

    /// Build Appium capabilities for this target
    fn capabilities(&self) -> Value {
        let mut caps = json!({
            "platformName": match self.platform {
                Platform::Android => "Android",
                Platform::Ios => "iOS",
            },
            "appium:deviceName": self.name,
            "appium:automationName": match self.platform {
                Platform::Android => "UIAutomator2",
                Platform::Ios => "XCUITest",
            },
        });

        match &self.kind {
            SessionKind::Local { device_id } => {
                caps["appium:udid"] = json!(device_id);
            }
            SessionKind::Cloud { provider, .. } => {
                caps["mobile:cloudProvider"] = json!(provider);
            }
            SessionKind::Emulator { name } => {
                caps["appium:avd"] = json!(name);
            }
        }

        if let Some(app) = &self.config.app {
            caps["appium:app"] = json!(app);
        }

        caps
    }

    /// Map an abstract lookup strategy to a driver locator
    fn locator(&self, strategy: &str, selector: &str) -> Option<(&'static str, String)> {
        match strategy {
            "id" => Some(("accessibility id", selector.to_string())),
            "text" => Some(match self.platform {
                Platform::Ios => (
                    "xpath",
                    format!(
                        "//XCUIElementTypeButton[@name=\"{0}\"] | //XCUIElementTypeStaticText[@name=\"{0}\"]",
                        selector
                    ),
                ),
                Platform::Android => ("xpath", format!("//*[@text=\"{}\"]", selector)),
            }),
            "partial-text" => Some(match self.platform {
                Platform::Ios => ("xpath", format!("//*[contains(@name,\"{}\")]", selector)),
                Platform::Android => ("xpath", format!("//*[contains(@text,\"{}\")]", selector)),
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DeviceSession for RemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn state(&self) -> SessionState {
        self.read_state().unwrap_or(SessionState::Closed)
    }

    async fn is_available(&self) -> Result<bool> {
        match &self.kind {
            SessionKind::Local { device_id } => {
                match self.driver.list_devices(self.platform).await {
                    Ok(devices) => Ok(devices.iter().any(|d| d == device_id)),
                    // Probe faults read as unavailable, never as errors
                    Err(e) => {
                        debug!("Availability probe failed for {}: {}", device_id, e);
                        Ok(false)
                    }
                }
            }
            // No authoritative check exists; report optimistically
            SessionKind::Cloud { .. } | SessionKind::Emulator { .. } => Ok(true),
        }
    }

    async fn connect(&self) -> Result<()> {
        let state = self.read_state()?;
        if state == SessionState::Closed {
            return Err(Error::session_closed(&self.id));
        }
        if state >= SessionState::Connected {
            warn!("Session {} already connected; reconnecting", self.id);
        }

        info!("Connecting to device: {}", self.id);
        let session_id = self
            .driver
            .create_session(self.capabilities())
            .await
            .map_err(|e| {
                Error::connection(format!(
                    "{}. Make sure the automation driver is running and reachable at {}",
                    e, self.config.driver_url
                ))
            })?;

        *self
            .driver_session
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))? = Some(session_id);
        self.set_state(SessionState::Connected)?;
        info!("Connected to device: {}", self.id);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.read_state()? == SessionState::Closed {
            return Err(Error::session_closed(&self.id));
        }

        let session = self
            .driver_session
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .take();
        if let Some(session_id) = session {
            self.driver.delete_session(&session_id).await?;
        }
        self.set_state(SessionState::Closed)?;
        Ok(())
    }

    async fn launch_app(&self, app_ref: &str) -> Result<()> {
        if self.read_state()? == SessionState::Closed {
            return Err(Error::session_closed(&self.id));
        }
        if self.require_session().is_err() {
            self.connect().await?;
        }
        let session = self.require_session()?;

        info!("Launching app: {}", app_ref);
        match self.driver.activate_app(&session, app_ref).await {
            Ok(()) => {
                self.set_state(SessionState::Launched)?;
                Ok(())
            }
            Err(primary) => {
                debug!("Primary launch failed, trying alternate: {}", primary);
                match self
                    .driver
                    .execute_script(&session, "mobile: launchApp", vec![json!({ "bundleId": app_ref })])
                    .await
                {
                    Ok(_) => {
                        // Give the app a moment to come to the foreground
                        tokio::time::sleep(std::time::Duration::from_millis(2000)).await;
                        self.set_state(SessionState::Launched)?;
                        info!("App launched using alternate method");
                        Ok(())
                    }
                    Err(alternate) => {
                        debug!("Alternate launch also failed: {}", alternate);
                        Err(Error::launch(primary.to_string()))
                    }
                }
            }
        }
    }

    async fn find_element(&self, strategy: &str, selector: &str) -> Result<Option<String>> {
        let session = self.require_session()?;
        let Some((using, value)) = self.locator(strategy, selector) else {
            return Ok(None);
        };
        self.driver.find_element(&session, using, &value).await
    }

    async fn find_element_by_image(&self, image_path: &str) -> Result<Option<String>> {
        let session = self.require_session()?;
        self.driver.find_element_by_image(&session, image_path).await
    }

    async fn click_element(&self, element_ref: &str) -> Result<()> {
        let session = self.require_session()?;
        self.driver.click_element(&session, element_ref).await
    }

    async fn type_text(&self, element_ref: &str, text: &str) -> Result<()> {
        let session = self.require_session()?;
        self.driver.type_text(&session, element_ref, text).await
    }

    async fn get_element_text(&self, element_ref: &str) -> Result<String> {
        let session = self.require_session()?;
        self.driver.element_text(&session, element_ref).await
    }

    async fn is_element_visible(&self, element_ref: &str) -> Result<bool> {
        let session = self.require_session()?;
        self.driver.element_displayed(&session, element_ref).await
    }

    async fn get_element_info(&self, element_ref: &str) -> Result<Value> {
        let session = self.require_session()?;
        self.driver.element_info(&session, element_ref).await
    }

    async fn get_element_location(&self, element_ref: &str) -> Result<Point> {
        let session = self.require_session()?;
        let rect = self.driver.element_rect(&session, element_ref).await?;
        Ok(Point { x: rect.x, y: rect.y })
    }

    async fn get_element_size(&self, element_ref: &str) -> Result<Size> {
        let session = self.require_session()?;
        let rect = self.driver.element_rect(&session, element_ref).await?;
        Ok(Size {
            width: rect.width,
            height: rect.height,
        })
    }

    async fn scroll_to_element(&self, element_ref: &str) -> Result<()> {
        let session = self.require_session()?;
        self.driver.scroll_to_element(&session, element_ref).await
    }

    async fn take_screenshot(&self, name: Option<&str>) -> Result<PathBuf> {
        let session = self.require_session()?;
        let encoded = self.driver.screenshot(&session).await?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| Error::driver(format!("Invalid screenshot payload: {}", e)))?;

        tokio::fs::create_dir_all(&self.config.screenshot_dir).await?;
        let filename = match name {
            Some(name) => name.to_string(),
            None => format!("screenshot_{}.png", chrono::Utc::now().timestamp_millis()),
        };
        let path = self.config.screenshot_dir.join(filename);
        tokio::fs::write(&path, bytes).await?;

        info!("Screenshot saved: {}", path.display());
        Ok(path)
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let session = self.require_session()?;
        self.driver.execute_script(&session, script, args).await
    }
}
