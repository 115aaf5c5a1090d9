//! Device resolver
//!
//! Turns a loosely-typed device identifier into a live, cached session. Owns the
//! only engine-level shared mutable state: the identifier → session cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::device::session::RemoteSession;
use crate::device::traits::{DeviceSession, DeviceTarget};
use crate::driver::Driver;
use crate::{Error, Result};

/// Factory producing driver handles for newly constructed sessions
pub type DriverFactory = Arc<dyn Fn() -> Result<Arc<dyn Driver>> + Send + Sync>;

/// Resolves device identifiers to sessions
///
/// Identifier grammar: `("local:" | "cloud:" | "emulator:")? <name>`. Absence of a
/// prefix triggers the auto-detect chain (local, then emulator, then cloud).
/// Resolved sessions are cached by the raw identifier string until released.
pub struct DeviceResolver {
    config: Arc<Config>,
    driver_factory: DriverFactory,
    sessions: RwLock<HashMap<String, Arc<dyn DeviceSession>>>,
}

impl DeviceResolver {
    /// Create a new resolver with a driver factory
    pub fn new<F>(config: Arc<Config>, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Driver>> + Send + Sync + 'static,
    {
        Self {
            config,
            driver_factory: Arc::new(factory),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a resolver backed by a shared mock driver, for testing
    pub fn mock(config: Arc<Config>, driver: Arc<dyn Driver>) -> Self {
        Self::new(config, move || Ok(driver.clone()))
    }

    /// Resolve a target to a session
    ///
    /// Pre-built sessions pass through untouched. Identifier strings are served
    /// from the cache when possible; otherwise a session is constructed for the
    /// matching branch and cached under the original identifier. Constructing a
    /// session never connects it.
    #[instrument(skip(self, target))]
    pub async fn resolve(&self, target: impl Into<DeviceTarget>) -> Result<Arc<dyn DeviceSession>> {
        let identifier = match target.into() {
            DeviceTarget::Session(session) => return Ok(session),
            DeviceTarget::Id(identifier) => identifier,
        };

        if let Some(session) = self.cached(&identifier)? {
            debug!("Device cache hit: {}", identifier);
            return Ok(session);
        }

        let session: Arc<dyn DeviceSession> = if let Some(name) = identifier.strip_prefix("cloud:")
        {
            info!("Connecting to cloud device: {}", name);
            self.cloud_session(name)?
        } else if let Some(name) = identifier.strip_prefix("emulator:") {
            info!("Starting emulator: {}", name);
            self.emulator_session(name)?
        } else if let Some(id) = identifier.strip_prefix("local:") {
            info!("Connecting to local device: {}", id);
            self.local_session(id)?
        } else {
            self.auto_detect(&identifier).await?
        };

        self.sessions
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .insert(identifier, session.clone());

        Ok(session)
    }

    /// Disconnect a session and drop every cache entry aliasing it
    pub async fn release(&self, session: &Arc<dyn DeviceSession>) -> Result<()> {
        session.disconnect().await?;
        self.sessions
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .retain(|_, cached| !Arc::ptr_eq(cached, session));
        Ok(())
    }

    /// List device ids currently visible to local tooling
    pub async fn list_devices(&self) -> Result<Vec<String>> {
        let driver = (self.driver_factory)()?;
        driver.list_devices(self.config.platform).await
    }

    /// Number of cached sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    fn cached(&self, identifier: &str) -> Result<Option<Arc<dyn DeviceSession>>> {
        Ok(self
            .sessions
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .get(identifier)
            .cloned())
    }

    fn local_session(&self, device_id: &str) -> Result<Arc<dyn DeviceSession>> {
        let driver = (self.driver_factory)()?;
        Ok(Arc::new(RemoteSession::local(
            device_id,
            self.config.clone(),
            driver,
        )))
    }

    fn cloud_session(&self, name: &str) -> Result<Arc<dyn DeviceSession>> {
        let provider = self
            .config
            .cloud_provider
            .clone()
            .unwrap_or_else(|| "browserstack".to_string());
        let driver = (self.driver_factory)()?;
        Ok(Arc::new(RemoteSession::cloud(
            name.to_string(),
            provider,
            self.config.clone(),
            driver,
        )))
    }

    fn emulator_session(&self, name: &str) -> Result<Arc<dyn DeviceSession>> {
        let driver = (self.driver_factory)()?;
        Ok(Arc::new(RemoteSession::emulator(
            name,
            self.config.clone(),
            driver,
        )))
    }

    /// Auto-detect chain: local (gated on availability), then emulator (adopted
    /// on construction, no availability gate), then cloud. Per-branch faults move
    /// the chain along; only full exhaustion is an error.
    async fn auto_detect(&self, identifier: &str) -> Result<Arc<dyn DeviceSession>> {
        info!("Auto-detecting device: {}", identifier);

        match self.local_session(identifier) {
            Ok(session) => match session.is_available().await {
                Ok(true) => {
                    debug!("Auto-detect adopted local device: {}", identifier);
                    return Ok(session);
                }
                Ok(false) => debug!("Local device not available: {}", identifier),
                Err(e) => debug!("Local availability probe failed: {}", e),
            },
            Err(e) => debug!("Local branch failed: {}", e),
        }

        match self.emulator_session(identifier) {
            Ok(session) => {
                debug!("Auto-detect adopted emulator: {}", identifier);
                return Ok(session);
            }
            Err(e) => debug!("Emulator branch failed: {}", e),
        }

        match self.cloud_session(identifier) {
            Ok(session) => {
                debug!("Auto-detect fell back to cloud: {}", identifier);
                Ok(session)
            }
            Err(e) => Err(Error::resolution(format!(
                "No device branch matched identifier '{}': {}",
                identifier, e
            ))),
        }
    }
}
