//! Request-timing interceptor (axum middleware).
//!
//! Times each monitored request around the rest of the pipeline and records
//! whole milliseconds into the built-in latency histogram, labelled with
//! (path, method, status). The status is read from the response after the
//! downstream stage returns. Recording problems never affect the response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::registry::{MetricRegistry, BUILTIN_LATENCY_METRIC};

/// Shared interceptor state; cheap to clone.
#[derive(Clone, Debug)]
pub struct Interceptor {
    registry: Arc<MetricRegistry>,
    prefixes: Arc<[String]>,
}

impl Interceptor {
    pub fn new(registry: Arc<MetricRegistry>, prefixes: Vec<String>) -> Self {
        Self {
            registry,
            prefixes: prefixes.into(),
        }
    }

    /// Empty prefix list monitors everything; otherwise the path must start
    /// with at least one prefix.
    pub fn is_monitored(&self, path: &str) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Observe one finished request. A missing or mis-kinded built-in is a no-op.
    pub fn record(&self, path: &str, method: &str, status: StatusCode, elapsed: Duration) {
        let Some(hist) = self.registry.histogram(BUILTIN_LATENCY_METRIC) else {
            tracing::warn!(metric = BUILTIN_LATENCY_METRIC, "latency histogram unavailable");
            return;
        };
        let status = status.as_u16().to_string();
        match hist.get_metric_with_label_values(&[path, method, status.as_str()]) {
            Ok(h) => h.observe(elapsed.as_millis() as f64),
            Err(e) => tracing::warn!(error = %e, "latency observation dropped"),
        }
    }
}

/// Middleware fn for `axum::middleware::from_fn_with_state`.
pub async fn track_latency(
    State(interceptor): State<Interceptor>,
    req: Request,
    next: Next,
) -> Response {
    if !interceptor.is_monitored(req.uri().path()) {
        return next.run(req).await;
    }

    let path = req.uri().path().to_string();
    let method = req.method().clone();

    let begin = Instant::now();
    let res = next.run(req).await;
    let latency = begin.elapsed();

    interceptor.record(&path, method.as_str(), res.status(), latency);
    res
}
