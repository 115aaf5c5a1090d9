//! Device resolution layer
//!
//! Resolves abstract device identifiers to live sessions and manages their
//! lifecycle.
//!
//! - `traits`: the `DeviceSession` capability interface and shared value types
//! - `session`: the driver-backed session with its local/cloud/emulator variants
//! - `resolver`: identifier parsing, caching, and the auto-detect chain

pub mod resolver;
pub mod session;
pub mod traits;


pub use resolver::{DeviceResolver, DriverFactory};
pub use session::{RemoteSession, SessionKind};
pub use traits::{DeviceSession, DeviceTarget, Platform, Point, SessionState, Size};
