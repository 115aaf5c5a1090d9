//! Mobile-Oxide: Rust-based mobile app automation engine
//!
//! Resolves loosely-typed device identifiers to live, cached device sessions and
//! flaky element selectors to concrete on-screen elements using a multi-strategy
//! search with bounded retries. A test scheduler layers independent per-unit
//! retry and bounded-parallel fan-out on top.

pub mod config;
pub mod error;

pub mod automation;
pub mod device;
pub mod driver;
pub mod element;
pub mod runner;

// Re-exports
pub use automation::MobileAuto;
pub use config::Config;
pub use error::{Error, Result};

/// Mobile-Oxide library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
