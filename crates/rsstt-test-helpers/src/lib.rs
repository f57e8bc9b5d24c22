//! Shared test utilities for the RSStT supervision crates.
//!
//! # Modules
//!
//! - [`mock`] - Recording collaborators and a non-exiting terminator
//! - [`wait`] - Polling helpers for detached async work
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rsstt-test-helpers = { workspace = true }
//! ```
//!
//! Only use it from `tests/` directories. The crate depends on
//! `rsstt-shutdown`, so unit tests inside that crate would see two copies
//! of its traits.

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod mock;
pub mod prelude;
pub mod wait;

/// Result type for tests that propagate errors with `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
