//! Automation driver layer
//!
//! Boundary between the resolution engine and the external automation driver.
//! `traits` defines the capability interface, `remote` the thin HTTP pass-through
//! to an Appium-compatible endpoint, and `mock` a scripted double for tests.

pub mod mock;
pub mod remote;
pub mod traits;

pub use mock::MockDriver;
pub use remote::RemoteDriver;
pub use traits::{Driver, Rect};
