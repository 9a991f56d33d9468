//! Shared test utilities for macro-reload integration tests.
//!
//! This module provides:
//! - `TestHarness` owning a temporary config directory
//! - Builders for writing config text programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{run, try_run, RunOutput, TestHarness};
