//! # Outbreak Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Catalog, settings, and context fixtures
//! - Scripted menu and record-store collaborators
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod strategies;

/// Re-export proptest for convenience.
pub use proptest;
