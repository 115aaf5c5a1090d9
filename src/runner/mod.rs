//! Test execution layer

pub mod scheduler;

#[cfg(test)]
mod tests;

pub use scheduler::{TestBody, TestCase, TestResult, TestRunner, TestStatus};
