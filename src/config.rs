//! Configuration management for Mobile-Oxide

use crate::device::Platform;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Engine configuration
///
/// Loaded from a file or from `MOBILE_*` environment variables; read-only to the
/// resolution engine. Per-call overrides go through `FindOptions`, not here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device identifier ("local:<id>", "cloud:<name>", "emulator:<name>", or bare for auto-detect)
    pub device: Option<String>,

    /// App under test: package/bundle identifier or file path
    pub app: Option<String>,

    /// Target platform
    pub platform: Platform,

    /// Cloud provider used by the cloud device branch
    pub cloud_provider: Option<String>,

    /// Default timeout budget for element resolution in milliseconds
    pub timeout_ms: u64,

    /// Default retry attempts for element resolution and test execution
    pub retries: u32,

    /// Record a diagnostic screenshot reference on failure
    pub screenshot_on_failure: bool,

    /// Run scheduled tests with bounded-parallel fan-out
    pub parallel: bool,

    /// Chunk size for parallel test execution
    pub max_parallel: usize,

    /// Automation driver endpoint (Appium-compatible)
    pub driver_url: String,

    /// Directory where screenshots are persisted
    pub screenshot_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            app: None,
            platform: Platform::Android,
            cloud_provider: None,
            timeout_ms: 10000,
            retries: 3,
            screenshot_on_failure: true,
            parallel: false,
            max_parallel: 5,
            driver_url: "http://127.0.0.1:4723".to_string(),
            screenshot_dir: PathBuf::from("screenshots"),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(device) = env::var("MOBILE_DEVICE") {
            config.device = Some(device);
        }

        if let Ok(app) = env::var("MOBILE_APP") {
            config.app = Some(app);
        }

        if let Ok(platform) = env::var("MOBILE_PLATFORM") {
            config.platform = platform
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_PLATFORM"))?;
        }

        if let Ok(provider) = env::var("MOBILE_CLOUD_PROVIDER") {
            config.cloud_provider = Some(provider);
        }

        if let Ok(timeout) = env::var("MOBILE_TIMEOUT_MS") {
            config.timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_TIMEOUT_MS"))?;
        }

        if let Ok(retries) = env::var("MOBILE_RETRIES") {
            config.retries = retries
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_RETRIES"))?;
        }

        if let Ok(screenshot) = env::var("MOBILE_SCREENSHOT_ON_FAILURE") {
            config.screenshot_on_failure = screenshot
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_SCREENSHOT_ON_FAILURE"))?;
        }

        if let Ok(parallel) = env::var("MOBILE_PARALLEL") {
            config.parallel = parallel
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_PARALLEL"))?;
        }

        if let Ok(max_parallel) = env::var("MOBILE_MAX_PARALLEL") {
            config.max_parallel = max_parallel
                .parse()
                .map_err(|_| Error::configuration("Invalid MOBILE_MAX_PARALLEL"))?;
        }

        if let Ok(driver_url) = env::var("MOBILE_DRIVER_URL") {
            config.driver_url = driver_url;
        }

        if let Ok(dir) = env::var("MOBILE_SCREENSHOT_DIR") {
            config.screenshot_dir = PathBuf::from(dir);
        }

        if let Ok(log_level) = env::var("MOBILE_LOG_LEVEL") {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }
}
