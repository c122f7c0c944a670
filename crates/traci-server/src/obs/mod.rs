//! Lightweight in-process metrics.
//!
//! Stored as atomics and rendered in Prometheus text format; the session
//! loop logs a snapshot when a controller disconnects.

pub mod metrics;

pub use metrics::TraciMetrics;
