//! promrelay HTTP middleware library entry.
//!
//! Wires the metric registry, the request-timing interceptor, and the
//! Pushgateway export loop into one middleware that plugs into an axum
//! `Router`. Consumed by the demo binary (`main.rs`) and by integration tests.

pub mod config;
pub mod intercept;
pub mod middleware;
pub mod obs;
pub mod push;
pub mod registry;

pub use intercept::Interceptor;
pub use middleware::{PushHandle, PushMiddleware};
pub use registry::{Collector, CollectorFactory, MetricRegistry, PrometheusFactory, SummaryVec};
