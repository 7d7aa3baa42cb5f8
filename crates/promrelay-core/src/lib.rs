//! promrelay core: metric definitions, push options, bucket presets, and the
//! shared error type.
//!
//! This crate describes *what* the middleware should create and how failures
//! are classified. It carries no runtime, HTTP, or collector-library
//! dependencies so definitions can be built and validated anywhere.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod buckets;
pub mod definition;
pub mod error;
pub mod options;

pub use definition::{MetricDefinition, MetricKind};
pub use options::PushOptions;
/// Shared result type.
pub use error::{Result, RelayError};
