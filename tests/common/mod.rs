//! Shared fixtures for integration tests

use std::sync::{Arc, Once};

use mobile_oxide::device::{DeviceResolver, DeviceSession};
use mobile_oxide::driver::{Driver, MockDriver};
use mobile_oxide::Config;

static TRACING: Once = Once::new();

/// Install a test subscriber once, honoring `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Config pointing screenshots at a scratch directory
pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        screenshot_dir: std::env::temp_dir().join("mobile-oxide-it"),
        ..Config::default()
    })
}

/// Resolver sharing one mock driver across all constructed sessions
pub fn resolver_with(config: Arc<Config>, driver: Arc<MockDriver>) -> DeviceResolver {
    DeviceResolver::mock(config, driver as Arc<dyn Driver>)
}

/// Resolve and connect a local session through the full resolution chain
pub async fn connected_local(
    resolver: &DeviceResolver,
    identifier: &str,
) -> Arc<dyn DeviceSession> {
    let session = resolver
        .resolve(identifier)
        .await
        .expect("device resolution failed");
    session.connect().await.expect("connect failed");
    session
}
