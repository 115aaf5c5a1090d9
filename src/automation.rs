//! High-level automation facade
//!
//! Ties the device resolver, element resolver, and configuration together behind
//! the API a test body actually uses. Thin orchestration only; every algorithm
//! lives in the layers below.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::device::{DeviceResolver, DeviceSession};
use crate::driver::{Driver, RemoteDriver};
use crate::element::{ElementHandle, ElementResolver, FindOptions};
use crate::{Error, Result};

/// High-level mobile automation entry point
pub struct MobileAuto {
    config: Arc<Config>,
    devices: DeviceResolver,
    elements: ElementResolver,
    current: RwLock<Option<Arc<dyn DeviceSession>>>,
    launched: RwLock<bool>,
}

impl MobileAuto {
    /// Create a facade talking to the configured driver endpoint
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let driver_url = config.driver_url.clone();
        Self::with_driver_factory(config, move || {
            Ok(Arc::new(RemoteDriver::new(driver_url.clone())) as Arc<dyn Driver>)
        })
    }

    /// Create a facade with a custom driver factory (used for testing)
    pub fn with_driver_factory<F>(config: Arc<Config>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Driver>> + Send + Sync + 'static,
    {
        Self {
            devices: DeviceResolver::new(config.clone(), factory),
            elements: ElementResolver::new(config.clone()),
            config,
            current: RwLock::new(None),
            launched: RwLock::new(false),
        }
    }

    /// Resolve and connect the configured device
    pub async fn init(&self) -> Result<()> {
        info!("Initializing MobileAuto");
        if let Some(identifier) = self.config.device.clone() {
            let session = self.devices.resolve(identifier).await?;
            session.connect().await?;
            info!("Connected to device: {}", session.id());
            *self.current.write().await = Some(session);
        }
        Ok(())
    }

    /// Launch the configured app, initializing first when needed
    pub async fn launch(&self) -> Result<()> {
        if self.current.read().await.is_none() {
            self.init().await?;
        }
        let session = self.session().await?;

        match &self.config.app {
            Some(app) => session.launch_app(app).await?,
            None => warn!("No app configured, skipping app launch"),
        }
        *self.launched.write().await = true;
        Ok(())
    }

    /// Find an element, launching the app first when needed
    pub async fn find(&self, selector: &str, options: FindOptions) -> Result<ElementHandle> {
        if !*self.launched.read().await {
            self.launch().await?;
        }
        let session = self.session().await?;
        self.elements.find(&session, selector, options).await
    }

    /// Tap an element
    pub async fn tap(&self, selector: &str) -> Result<()> {
        let element = self.find(selector, FindOptions::default()).await?;
        element.click().await
    }

    /// Type text into an element
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.find(selector, FindOptions::default()).await?;
        element.type_text(text).await
    }

    /// Read an element's text content
    pub async fn read_text(&self, selector: &str) -> Result<String> {
        let element = self.find(selector, FindOptions::default()).await?;
        element.text().await
    }

    /// Wait for an element under a caller-supplied timeout
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<ElementHandle> {
        self.find(
            selector,
            FindOptions {
                timeout_ms: Some(timeout_ms),
                retries: None,
            },
        )
        .await
    }

    /// Capture a screenshot of the current device
    pub async fn screenshot(&self, name: Option<&str>) -> Result<PathBuf> {
        let session = self.session().await?;
        session.take_screenshot(name).await
    }

    /// Release the current device session
    pub async fn quit(&self) -> Result<()> {
        if let Some(session) = self.current.write().await.take() {
            self.devices.release(&session).await?;
        }
        *self.launched.write().await = false;
        Ok(())
    }

    /// Resolver for direct device management
    pub fn devices(&self) -> &DeviceResolver {
        &self.devices
    }

    async fn session(&self) -> Result<Arc<dyn DeviceSession>> {
        self.current
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::internal("No device available. Specify a device in the config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn facade(driver: Arc<MockDriver>, config: Config) -> MobileAuto {
        MobileAuto::with_driver_factory(Arc::new(config), move || {
            Ok(driver.clone() as Arc<dyn Driver>)
        })
    }

    #[tokio::test]
    async fn test_find_connects_and_launches_on_demand() {
        let driver = Arc::new(MockDriver::new());
        driver.add_element("accessibility id", "login", "elem-1");
        let auto = facade(
            driver.clone(),
            Config {
                device: Some("local:emulator-5554".to_string()),
                app: Some("com.example.app".to_string()),
                ..Config::default()
            },
        );

        let element = auto.find("login", FindOptions::default()).await.unwrap();
        assert_eq!(element.element_ref(), "elem-1");
        assert_eq!(driver.create_session_count(), 1);
        assert_eq!(driver.activate_app_count(), 1);
    }

    #[tokio::test]
    async fn test_find_without_device_fails() {
        let driver = Arc::new(MockDriver::new());
        let auto = facade(driver, Config::default());

        let result = auto.find("login", FindOptions::default()).await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_quit_releases_session() {
        let driver = Arc::new(MockDriver::new());
        let auto = facade(
            driver,
            Config {
                device: Some("local:emulator-5554".to_string()),
                ..Config::default()
            },
        );

        auto.init().await.unwrap();
        assert_eq!(auto.devices().session_count(), 1);

        auto.quit().await.unwrap();
        assert_eq!(auto.devices().session_count(), 0);
    }
}
