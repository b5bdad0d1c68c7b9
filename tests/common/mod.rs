//! Common test utilities for safe-fetch integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
