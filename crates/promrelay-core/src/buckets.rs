//! Histogram bucket presets (milliseconds).
//!
//! The interceptor observes latency in whole milliseconds, so these presets
//! are expressed in the same unit.

/// 500ms steps up to 5s. Used by the built-in latency histogram.
pub const INTERVAL_500_MS: [f64; 10] = [
    500.0, 1_000.0, 1_500.0, 2_000.0, 2_500.0, 3_000.0, 3_500.0, 4_000.0, 4_500.0, 5_000.0,
];

/// 100ms steps up to 1s.
pub const INTERVAL_100_MS: [f64; 10] = [
    100.0, 200.0, 300.0, 400.0, 500.0, 600.0, 700.0, 800.0, 900.0, 1_000.0,
];

/// Upper bounds must be finite and strictly increasing.
pub fn is_valid(buckets: &[f64]) -> bool {
    buckets.iter().all(|b| b.is_finite()) && buckets.windows(2).all(|w| w[0] < w[1])
}
