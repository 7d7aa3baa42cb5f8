//! Observability helpers.
//!
//! Structured events go through `tracing`; the push loop additionally writes
//! one plain line per cycle to a swappable `LogSink`.

pub mod log_sink;

pub use log_sink::LogSink;
