//! Top-level facade crate for promrelay.
//!
//! Re-exports core types and the HTTP middleware so users can depend on a single crate.

pub mod core {
    pub use promrelay_core::*;
}

pub mod http {
    pub use promrelay_http::*;
}

pub use promrelay_core::{MetricDefinition, MetricKind, PushOptions, RelayError, Result};
pub use promrelay_http::{PushHandle, PushMiddleware};
