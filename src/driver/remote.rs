//! Remote automation driver
//!
//! Thin HTTP pass-through to an Appium-compatible WebDriver endpoint. No retry or
//! resolution logic lives here; faults surface as transport errors and the engine
//! layers above decide what to do with them.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::debug;

use crate::device::Platform;
use crate::driver::traits::{Driver, Rect};
use crate::{Error, Result};

/// W3C WebDriver element identifier key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Remote WebDriver client
pub struct RemoteDriver {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteDriver {
    /// Create a new remote driver against the given endpoint
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoint this driver talks to
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        Self::unwrap_value(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(&body).send().await?;
        Self::unwrap_value(response).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.delete(&url).send().await?;
        Self::unwrap_value(response).await
    }

    /// Unwrap the WebDriver `{"value": ...}` envelope, mapping protocol errors
    async fn unwrap_value(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let error = value
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown")
                .to_string();
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("")
                .to_string();
            return Err(Error::driver(format!("{}: {}", error, message)));
        }

        Ok(value)
    }

    fn is_no_such_element(err: &Error) -> bool {
        matches!(err, Error::Driver(msg) if msg.starts_with("no such element"))
    }

    fn extract_element_ref(value: &Value) -> Option<String> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get("ELEMENT"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl Driver for RemoteDriver {
    async fn create_session(&self, capabilities: Value) -> Result<String> {
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let value = self.post("/session", body).await?;

        value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::driver("Session response missing sessionId"))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.delete(&format!("/session/{}", session_id)).await?;
        Ok(())
    }

    async fn list_devices(&self, platform: Platform) -> Result<Vec<String>> {
        match platform {
            Platform::Android => {
                let output = Command::new("adb").arg("devices").output().await?;
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(parse_adb_devices(&stdout))
            }
            Platform::Ios => {
                let output = Command::new("xcrun")
                    .args(["simctl", "list", "devices"])
                    .output()
                    .await?;
                let stdout = String::from_utf8_lossy(&output.stdout);
                Ok(parse_simctl_devices(&stdout))
            }
        }
    }

    async fn find_element(
        &self,
        session_id: &str,
        using: &str,
        value: &str,
    ) -> Result<Option<String>> {
        let body = json!({ "using": using, "value": value });
        match self.post(&format!("/session/{}/element", session_id), body).await {
            Ok(response) => Ok(Self::extract_element_ref(&response)),
            Err(err) if Self::is_no_such_element(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_element_by_image(
        &self,
        session_id: &str,
        image_path: &str,
    ) -> Result<Option<String>> {
        // Requires the driver's image plugin; template is sent base64-encoded
        let template = tokio::fs::read(image_path).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(template);
        let body = json!({ "using": "-image", "value": encoded });
        match self.post(&format!("/session/{}/element", session_id), body).await {
            Ok(response) => Ok(Self::extract_element_ref(&response)),
            Err(err) if Self::is_no_such_element(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn activate_app(&self, session_id: &str, app_ref: &str) -> Result<()> {
        debug!("Activating app: {}", app_ref);
        self.post(
            &format!("/session/{}/appium/device/activate_app", session_id),
            json!({ "appId": app_ref, "bundleId": app_ref }),
        )
        .await?;
        Ok(())
    }

    async fn click_element(&self, session_id: &str, element_ref: &str) -> Result<()> {
        self.post(
            &format!("/session/{}/element/{}/click", session_id, element_ref),
            json!({}),
        )
        .await?;
        Ok(())
    }

    async fn type_text(&self, session_id: &str, element_ref: &str, text: &str) -> Result<()> {
        self.post(
            &format!("/session/{}/element/{}/value", session_id, element_ref),
            json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    async fn element_text(&self, session_id: &str, element_ref: &str) -> Result<String> {
        let value = self
            .get(&format!("/session/{}/element/{}/text", session_id, element_ref))
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn element_displayed(&self, session_id: &str, element_ref: &str) -> Result<bool> {
        let value = self
            .get(&format!(
                "/session/{}/element/{}/displayed",
                session_id, element_ref
            ))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn element_info(&self, session_id: &str, element_ref: &str) -> Result<Value> {
        // The rect query doubles as the liveness probe: a stale reference fails here
        self.get(&format!(
            "/session/{}/element/{}/rect",
            session_id, element_ref
        ))
        .await
    }

    async fn element_rect(&self, session_id: &str, element_ref: &str) -> Result<Rect> {
        let value = self
            .get(&format!(
                "/session/{}/element/{}/rect",
                session_id, element_ref
            ))
            .await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    async fn scroll_to_element(&self, session_id: &str, element_ref: &str) -> Result<()> {
        self.execute_script(
            session_id,
            "mobile: scroll",
            vec![json!({ "elementId": element_ref, "toVisible": true })],
        )
        .await?;
        Ok(())
    }

    async fn screenshot(&self, session_id: &str) -> Result<String> {
        let value = self
            .get(&format!("/session/{}/screenshot", session_id))
            .await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::driver("Screenshot response missing payload"))
    }

    async fn execute_script(
        &self,
        session_id: &str,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.post(
            &format!("/session/{}/execute/sync", session_id),
            json!({ "script": script, "args": args }),
        )
        .await
    }
}

/// Parse `adb devices` output into device ids
fn parse_adb_devices(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let mut parts = line.split_whitespace();
            let id = parts.next()?;
            match parts.next() {
                Some("device") => Some(id.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Parse `xcrun simctl list devices` output into simulator udids
fn parse_simctl_devices(output: &str) -> Vec<String> {
    // Device names may themselves contain parentheses, so every parenthesized
    // token is checked. Simulator udids are 36-char hyphenated uuids.
    output
        .lines()
        .flat_map(|line| {
            line.match_indices('(').filter_map(move |(open, _)| {
                let rest = &line[open + 1..];
                let close = rest.find(')')?;
                let candidate = &rest[..close];
                if candidate.len() == 36 && candidate.chars().filter(|c| *c == '-').count() == 4 {
                    Some(candidate.to_string())
                } else {
                    None
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adb_devices() {
        let output = "List of devices attached\nemulator-5554\tdevice\n0A3B\toffline\n\n";
        let devices = parse_adb_devices(output);
        assert_eq!(devices, vec!["emulator-5554".to_string()]);
    }

    #[test]
    fn test_parse_adb_devices_empty() {
        let output = "List of devices attached\n\n";
        assert!(parse_adb_devices(output).is_empty());
    }

    #[test]
    fn test_parse_simctl_devices() {
        let output = "== Devices ==\n-- iOS 18.1 --\n    iPhone 17 Pro (0A1B2C3D-1111-2222-3333-444455556666) (Booted)\n";
        let devices = parse_simctl_devices(output);
        assert_eq!(devices, vec!["0A1B2C3D-1111-2222-3333-444455556666".to_string()]);
    }

    #[test]
    fn test_parse_simctl_devices_parenthesized_name() {
        let output = "    iPad (10th generation) (AAAAAAAA-BBBB-CCCC-DDDD-EEEEFFFF0000) (Shutdown)\n";
        let devices = parse_simctl_devices(output);
        assert_eq!(
            devices,
            vec!["AAAAAAAA-BBBB-CCCC-DDDD-EEEEFFFF0000".to_string()]
        );
    }

    #[test]
    fn test_extract_element_ref() {
        let value = json!({ ELEMENT_KEY: "elem-42" });
        assert_eq!(
            RemoteDriver::extract_element_ref(&value),
            Some("elem-42".to_string())
        );
        assert_eq!(RemoteDriver::extract_element_ref(&json!(null)), None);
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let driver = RemoteDriver::new("http://127.0.0.1:4723/");
        assert_eq!(driver.endpoint(), "http://127.0.0.1:4723");
    }
}
