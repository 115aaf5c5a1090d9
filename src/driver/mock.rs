//! Mock automation driver for testing
//!
//! Scripts every driver primitive and records call counts so tests can assert on
//! strategy ordering, short-circuiting, and retry behavior without a live endpoint.

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::device::Platform;
use crate::driver::traits::{Driver, Rect};
use crate::{Error, Result};

#[derive(Default)]
struct MockState {
    devices: Vec<String>,
    /// (using, value) -> element reference
    elements: HashMap<(String, String), String>,
    /// image template path -> element reference
    image_elements: HashMap<String, String>,
    /// (using, value) -> (element reference, misses left before it appears)
    delayed_elements: HashMap<(String, String), (String, usize)>,
    /// references the driver still reports as live
    live_refs: HashSet<String>,
    element_texts: HashMap<String, String>,
    sessions: HashSet<String>,
    fail_create_session: bool,
    fail_list_devices: bool,
    fail_activate_app: bool,
    fail_execute_script: bool,
    /// locators that raise a transport fault instead of returning
    faulty_locators: HashSet<(String, String)>,
}

/// Mock driver with scripted responses and call counters
#[derive(Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
    find_element_calls: AtomicUsize,
    find_by_image_calls: AtomicUsize,
    create_session_calls: AtomicUsize,
    activate_app_calls: AtomicUsize,
    execute_script_calls: AtomicUsize,
    screenshot_calls: AtomicUsize,
    find_calls_by_using: Mutex<HashMap<String, usize>>,
}

impl MockDriver {
    /// Create a new mock driver with no scripted devices or elements
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Script a visible device id
    pub fn add_device<S: Into<String>>(&self, id: S) {
        self.state().devices.push(id.into());
    }

    /// Script an element resolvable by the given locator
    pub fn add_element<S: Into<String>>(&self, using: S, value: S, element_ref: S) {
        let element_ref = element_ref.into();
        let mut state = self.state();
        state
            .elements
            .insert((using.into(), value.into()), element_ref.clone());
        state.live_refs.insert(element_ref);
    }

    /// Script an element that only appears after the locator missed `misses` times
    pub fn add_element_after_misses<S: Into<String>>(
        &self,
        using: S,
        value: S,
        element_ref: S,
        misses: usize,
    ) {
        let element_ref = element_ref.into();
        let mut state = self.state();
        state
            .delayed_elements
            .insert((using.into(), value.into()), (element_ref.clone(), misses));
        state.live_refs.insert(element_ref);
    }

    /// Script an element resolvable by image template path
    pub fn add_image_element<S: Into<String>>(&self, path: S, element_ref: S) {
        let element_ref = element_ref.into();
        let mut state = self.state();
        state.image_elements.insert(path.into(), element_ref.clone());
        state.live_refs.insert(element_ref);
    }

    /// Script an element's text content
    pub fn set_element_text<S: Into<String>>(&self, element_ref: S, text: S) {
        self.state()
            .element_texts
            .insert(element_ref.into(), text.into());
    }

    /// Stop reporting a reference as live (stale element)
    pub fn invalidate_element(&self, element_ref: &str) {
        self.state().live_refs.remove(element_ref);
    }

    /// Make session creation fail with a transport error
    pub fn fail_create_session(&self, fail: bool) {
        self.state().fail_create_session = fail;
    }

    /// Make the device-listing probe fail
    pub fn fail_list_devices(&self, fail: bool) {
        self.state().fail_list_devices = fail;
    }

    /// Make app activation (primary launch mechanism) fail
    pub fn fail_activate_app(&self, fail: bool) {
        self.state().fail_activate_app = fail;
    }

    /// Make script execution (alternate launch mechanism) fail
    pub fn fail_execute_script(&self, fail: bool) {
        self.state().fail_execute_script = fail;
    }

    /// Make a specific locator raise a transport fault
    pub fn fault_locator<S: Into<String>>(&self, using: S, value: S) {
        self.state()
            .faulty_locators
            .insert((using.into(), value.into()));
    }

    /// Total `find_element` invocations
    pub fn find_element_count(&self) -> usize {
        self.find_element_calls.load(Ordering::SeqCst)
    }

    /// `find_element` invocations for a specific locator strategy
    pub fn find_count_for(&self, using: &str) -> usize {
        self.find_calls_by_using
            .lock()
            .expect("mock counters poisoned")
            .get(using)
            .copied()
            .unwrap_or(0)
    }

    /// Total image-strategy invocations
    pub fn find_by_image_count(&self) -> usize {
        self.find_by_image_calls.load(Ordering::SeqCst)
    }

    /// Total sessions created
    pub fn create_session_count(&self) -> usize {
        self.create_session_calls.load(Ordering::SeqCst)
    }

    /// Total app activations attempted
    pub fn activate_app_count(&self) -> usize {
        self.activate_app_calls.load(Ordering::SeqCst)
    }

    /// Total scripts executed
    pub fn execute_script_count(&self) -> usize {
        self.execute_script_calls.load(Ordering::SeqCst)
    }

    /// Total screenshots captured
    pub fn screenshot_count(&self) -> usize {
        self.screenshot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn create_session(&self, _capabilities: Value) -> Result<String> {
        self.create_session_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        if state.fail_create_session {
            return Err(Error::http("connection refused"));
        }
        let id = Uuid::new_v4().to_string();
        state.sessions.insert(id.clone());
        Ok(id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.state().sessions.remove(session_id);
        Ok(())
    }

    async fn list_devices(&self, _platform: Platform) -> Result<Vec<String>> {
        let state = self.state();
        if state.fail_list_devices {
            return Err(Error::http("device listing unavailable"));
        }
        Ok(state.devices.clone())
    }

    async fn find_element(
        &self,
        _session_id: &str,
        using: &str,
        value: &str,
    ) -> Result<Option<String>> {
        self.find_element_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .find_calls_by_using
            .lock()
            .expect("mock counters poisoned")
            .entry(using.to_string())
            .or_insert(0) += 1;

        let mut state = self.state();
        let key = (using.to_string(), value.to_string());
        if state.faulty_locators.contains(&key) {
            return Err(Error::http("transport fault"));
        }
        if let Some((element_ref, misses)) = state.delayed_elements.get_mut(&key) {
            if *misses == 0 {
                return Ok(Some(element_ref.clone()));
            }
            *misses -= 1;
            return Ok(None);
        }
        Ok(state.elements.get(&key).cloned())
    }

    async fn find_element_by_image(
        &self,
        _session_id: &str,
        image_path: &str,
    ) -> Result<Option<String>> {
        self.find_by_image_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().image_elements.get(image_path).cloned())
    }

    async fn activate_app(&self, _session_id: &str, _app_ref: &str) -> Result<()> {
        self.activate_app_calls.fetch_add(1, Ordering::SeqCst);
        if self.state().fail_activate_app {
            return Err(Error::driver("activation rejected"));
        }
        Ok(())
    }

    async fn click_element(&self, _session_id: &str, element_ref: &str) -> Result<()> {
        if self.state().live_refs.contains(element_ref) {
            Ok(())
        } else {
            Err(Error::driver(format!("stale element: {}", element_ref)))
        }
    }

    async fn type_text(&self, _session_id: &str, element_ref: &str, _text: &str) -> Result<()> {
        if self.state().live_refs.contains(element_ref) {
            Ok(())
        } else {
            Err(Error::driver(format!("stale element: {}", element_ref)))
        }
    }

    async fn element_text(&self, _session_id: &str, element_ref: &str) -> Result<String> {
        Ok(self
            .state()
            .element_texts
            .get(element_ref)
            .cloned()
            .unwrap_or_default())
    }

    async fn element_displayed(&self, _session_id: &str, element_ref: &str) -> Result<bool> {
        Ok(self.state().live_refs.contains(element_ref))
    }

    async fn element_info(&self, _session_id: &str, element_ref: &str) -> Result<Value> {
        if self.state().live_refs.contains(element_ref) {
            Ok(json!({ "x": 0, "y": 0, "width": 100, "height": 40 }))
        } else {
            Err(Error::driver(format!("stale element: {}", element_ref)))
        }
    }

    async fn element_rect(&self, _session_id: &str, element_ref: &str) -> Result<Rect> {
        if self.state().live_refs.contains(element_ref) {
            Ok(Rect {
                x: 0,
                y: 0,
                width: 100,
                height: 40,
            })
        } else {
            Err(Error::driver(format!("stale element: {}", element_ref)))
        }
    }

    async fn scroll_to_element(&self, _session_id: &str, _element_ref: &str) -> Result<()> {
        Ok(())
    }

    async fn screenshot(&self, _session_id: &str) -> Result<String> {
        self.screenshot_calls.fetch_add(1, Ordering::SeqCst);
        Ok(base64::engine::general_purpose::STANDARD.encode(b"mock-png"))
    }

    async fn execute_script(
        &self,
        _session_id: &str,
        _script: &str,
        _args: Vec<Value>,
    ) -> Result<Value> {
        self.execute_script_calls.fetch_add(1, Ordering::SeqCst);
        if self.state().fail_execute_script {
            return Err(Error::driver("script rejected"));
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_element_lookup() {
        let driver = MockDriver::new();
        driver.add_element("accessibility id", "login", "elem-1");

        let found = driver
            .find_element("s", "accessibility id", "login")
            .await
            .unwrap();
        assert_eq!(found, Some("elem-1".to_string()));
        assert_eq!(driver.find_element_count(), 1);
        assert_eq!(driver.find_count_for("accessibility id"), 1);

        let missing = driver.find_element("s", "xpath", "//nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_faulty_locator() {
        let driver = MockDriver::new();
        driver.fault_locator("xpath", "//boom");

        let result = driver.find_element("s", "xpath", "//boom").await;
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn test_element_liveness() {
        let driver = MockDriver::new();
        driver.add_element("accessibility id", "login", "elem-1");

        assert!(driver.element_info("s", "elem-1").await.is_ok());
        driver.invalidate_element("elem-1");
        assert!(driver.element_info("s", "elem-1").await.is_err());
    }
}
