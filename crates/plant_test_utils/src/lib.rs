//! # Plant Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Plant fixtures
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

/// Re-export plant_core so consumers can name the exact crate instance
/// the fixtures are built from.
pub use plant_core;
