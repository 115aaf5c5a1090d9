//! Integration tests for element resolution

use std::sync::Arc;
use tokio::time::Instant;

use crate::config::Config;
use crate::device::{DeviceSession, RemoteSession};
use crate::driver::MockDriver;
use crate::element::handle::ElementHandle;
use crate::element::resolver::{ElementResolver, FindOptions};
use crate::Error;

const LOGIN_TEXT_XPATH: &str = "//*[@text=\"Login\"]";
const LOGIN_PARTIAL_XPATH: &str = "//*[contains(@text,\"Login\")]";

async fn connected_session(
    driver: Arc<MockDriver>,
    config: Arc<Config>,
) -> Arc<dyn DeviceSession> {
    let session: Arc<dyn DeviceSession> =
        Arc::new(RemoteSession::local("emulator-5554", config, driver));
    session.connect().await.expect("connect failed");
    session
}

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        screenshot_dir: std::env::temp_dir().join("mobile-oxide-element-tests"),
        ..Config::default()
    })
}

#[tokio::test]
async fn test_identifier_strategy_short_circuits() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element("accessibility id", "login", "elem-1");
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let handle = resolver
        .find(&session, "login", FindOptions::default())
        .await
        .unwrap();

    assert_eq!(handle.element_ref(), "elem-1");
    assert_eq!(driver.find_count_for("accessibility id"), 1);
    assert_eq!(driver.find_count_for("xpath"), 0);
    assert_eq!(driver.find_by_image_count(), 0);
}

#[tokio::test]
async fn test_exact_text_when_identifier_misses() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element("xpath", LOGIN_TEXT_XPATH, "elem-2");
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let handle = resolver
        .find(&session, "Login", FindOptions::default())
        .await
        .unwrap();

    assert_eq!(handle.element_ref(), "elem-2");
    assert_eq!(driver.find_count_for("accessibility id"), 1);
    assert_eq!(driver.find_count_for("xpath"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_partial_text_succeeds_on_second_attempt() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element_after_misses("xpath", LOGIN_PARTIAL_XPATH, "elem-3", 1);
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let handle = resolver
        .find(
            &session,
            "Login",
            FindOptions {
                timeout_ms: Some(5000),
                retries: Some(3),
            },
        )
        .await
        .unwrap();

    assert_eq!(handle.element_ref(), "elem-3");
    // Two full attempts: id and exact-text were each tried twice
    assert_eq!(driver.find_count_for("accessibility id"), 2);
    // No image extension on the selector, so the image strategy never ran
    assert_eq!(driver.find_by_image_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_sleeps_and_screenshots() {
    let driver = Arc::new(MockDriver::new());
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let start = Instant::now();
    let err = resolver
        .find(&session, "missing", FindOptions::default())
        .await
        .unwrap_err();

    // Three attempts, two backoff sleeps, no trailing sleep
    assert_eq!(start.elapsed().as_millis(), 2000);
    assert_eq!(driver.screenshot_count(), 1);

    match err {
        Error::ElementNotFound {
            selector,
            attempts,
            screenshot,
        } => {
            assert_eq!(selector, "missing");
            assert_eq!(attempts, 3);
            let path = screenshot.expect("screenshot path missing");
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("element_not_found_"));
        }
        other => panic!("expected ElementNotFound, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_timeout_budget_gates_sleeps() {
    let driver = Arc::new(MockDriver::new());
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let start = Instant::now();
    let err = resolver
        .find(
            &session,
            "missing",
            FindOptions {
                timeout_ms: Some(500),
                retries: Some(3),
            },
        )
        .await
        .unwrap_err();

    // After the first backoff the budget is spent; later attempts run without
    // sleeping but still run
    assert_eq!(start.elapsed().as_millis(), 1000);
    assert!(matches!(err, Error::ElementNotFound { attempts: 3, .. }));
    assert_eq!(driver.find_count_for("accessibility id"), 3);
}

#[tokio::test]
async fn test_screenshot_policy_off() {
    let driver = Arc::new(MockDriver::new());
    let config = Arc::new(Config {
        screenshot_on_failure: false,
        retries: 1,
        ..Config::default()
    });
    let session = connected_session(driver.clone(), config.clone()).await;
    let resolver = ElementResolver::new(config);

    let err = resolver
        .find(&session, "missing", FindOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::ElementNotFound {
            screenshot: None,
            ..
        }
    ));
    assert_eq!(driver.screenshot_count(), 0);
}

#[tokio::test]
async fn test_transport_fault_is_absorbed() {
    let driver = Arc::new(MockDriver::new());
    driver.fault_locator("accessibility id", "Login");
    driver.add_element("xpath", LOGIN_TEXT_XPATH, "elem-4");
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    // The faulting identifier strategy reads as not-found; exact text wins
    let handle = resolver
        .find(&session, "Login", FindOptions::default())
        .await
        .unwrap();
    assert_eq!(handle.element_ref(), "elem-4");
}

#[tokio::test]
async fn test_stale_reference_falls_through() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element("accessibility id", "Login", "stale-ref");
    driver.add_element("xpath", LOGIN_TEXT_XPATH, "live-ref");
    driver.invalidate_element("stale-ref");
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    // The identifier strategy resolves a reference that fails the liveness
    // re-check; the next strategy supplies the winner
    let handle = resolver
        .find(&session, "Login", FindOptions::default())
        .await
        .unwrap();
    assert_eq!(handle.element_ref(), "live-ref");
}

#[tokio::test]
async fn test_retry_override_is_honored() {
    let driver = Arc::new(MockDriver::new());
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let err = resolver
        .find(
            &session,
            "missing",
            FindOptions {
                timeout_ms: None,
                retries: Some(1),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ElementNotFound { attempts: 1, .. }));
}

#[tokio::test]
async fn test_handle_actions_delegate_to_session() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element("accessibility id", "greeting", "elem-5");
    driver.set_element_text("elem-5", "Hello");
    let session = connected_session(driver.clone(), test_config()).await;
    let resolver = ElementResolver::new(test_config());

    let handle = resolver
        .find(&session, "greeting", FindOptions::default())
        .await
        .unwrap();

    assert!(handle.exists().await);
    assert!(handle.is_visible().await.unwrap());
    assert_eq!(handle.text().await.unwrap(), "Hello");
    handle.click().await.unwrap();
    handle.type_text("hi").await.unwrap();

    let location = handle.location().await.unwrap();
    assert_eq!(location.x, 0);
    let size = handle.size().await.unwrap();
    assert_eq!(size.width, 100);
}

#[tokio::test]
async fn test_handle_outliving_session_fails() {
    let driver = Arc::new(MockDriver::new());
    driver.add_element("accessibility id", "login", "elem-6");
    let session = connected_session(driver.clone(), test_config()).await;

    let handle = ElementHandle::new(&session, "elem-6".to_string());
    drop(session);

    assert!(!handle.exists().await);
    assert!(matches!(
        handle.click().await,
        Err(Error::SessionClosed(_))
    ));
}
