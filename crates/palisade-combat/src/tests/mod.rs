//! Test module for determinism and integration tests.
//!
//! This module covers the combat engine end to end:
//! - **Determinism tests**: Verify same seed and script produce identical results
//! - **Integration tests**: Full frame pipeline, from fire to resolved damage
//! - **Helper functions**: Utilities for building worlds and stepping engines
//!
//! # Test Structure
//!
//! - `determinism.rs`: Tests that verify deterministic execution
//! - `integration.rs`: End-to-end tests of whole combat scenarios
//! - `helpers.rs`: Test setup utilities and factory functions

mod helpers;

// Re-export for convenience
pub use helpers::*;
