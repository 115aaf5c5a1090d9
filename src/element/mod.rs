//! Element resolution layer
//!
//! Multi-strategy element lookup with bounded retries and a timeout budget.
//!
//! - `strategy`: the ordered, pluggable lookup strategies
//! - `resolver`: the retry/backoff engine that drives them
//! - `handle`: the resulting element wrapper with high-level actions

pub mod handle;
pub mod resolver;
pub mod strategy;

#[cfg(test)]
mod tests;

pub use handle::ElementHandle;
pub use resolver::{ElementResolver, FindOptions};
pub use strategy::{
    default_strategies, ByExactText, ByIdentifier, ByImage, ByPartialText, FindAttempt,
    FindStrategy,
};
