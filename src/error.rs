//! Unified error types for Mobile-Oxide

use std::path::PathBuf;
use thiserror::Error;

/// Unified Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Mobile-Oxide
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport errors from the automation driver
    #[error("HTTP error: {0}")]
    Http(String),

    /// Driver protocol errors
    #[error("Driver error: {0}")]
    Driver(String),

    /// No device branch could be resolved for an identifier
    #[error("Device resolution failed: {0}")]
    Resolution(String),

    /// Session construction succeeded but the underlying connect failed
    #[error("Device connection failed: {0}")]
    Connection(String),

    /// Both primary and alternate app launch mechanisms failed
    #[error("App launch failed: {0}")]
    Launch(String),

    /// Element resolution exhausted its retry/strategy space
    #[error("Element not found: {selector} after {attempts} attempts{}", screenshot_note(.screenshot))]
    ElementNotFound {
        selector: String,
        attempts: u32,
        screenshot: Option<PathBuf>,
    },

    /// Operation attempted on a closed session
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Operation timeout
    #[error("Operation timeout: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn screenshot_note(screenshot: &Option<PathBuf>) -> String {
    match screenshot {
        Some(path) => format!(". Screenshot saved: {}", path.display()),
        None => String::new(),
    }
}

impl Error {
    /// Create a new HTTP transport error
    pub fn http<S: Into<String>>(msg: S) -> Self {
        Error::Http(msg.into())
    }

    /// Create a new driver protocol error
    pub fn driver<S: Into<String>>(msg: S) -> Self {
        Error::Driver(msg.into())
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        Error::Resolution(msg.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a new launch error
    pub fn launch<S: Into<String>>(msg: S) -> Self {
        Error::Launch(msg.into())
    }

    /// Create a new element not found error
    pub fn element_not_found<S: Into<String>>(
        selector: S,
        attempts: u32,
        screenshot: Option<PathBuf>,
    ) -> Self {
        Error::ElementNotFound {
            selector: selector.into(),
            attempts,
            screenshot,
        }
    }

    /// Create a new session closed error
    pub fn session_closed<S: Into<String>>(id: S) -> Self {
        Error::SessionClosed(id.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Error::Timeout(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_display() {
        let err = Error::element_not_found("Login", 3, Some(PathBuf::from("shots/x.png")));
        let msg = err.to_string();
        assert!(msg.contains("Login"));
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("shots/x.png"));
    }

    #[test]
    fn test_element_not_found_without_screenshot() {
        let err = Error::element_not_found("Login", 3, None);
        assert!(!err.to_string().contains("Screenshot"));
    }

    #[test]
    fn test_connection_error_display() {
        let err = Error::connection("refused. Make sure the driver is running");
        assert!(err.to_string().starts_with("Device connection failed"));
    }
}
