//! Logging and metrics.
//!
//! - `logging`: one global `tracing` subscriber, filtered by config or `RUST_LOG`
//! - `metrics`: Prometheus exporter plus typed recorders for refresh cycles,
//!   pool changes, admission waits and dispatched requests

pub mod logging;
pub mod metrics;
