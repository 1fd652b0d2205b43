//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_refresh_total` (counter): refresh cycles by outcome
//! - `gateway_refresh_duration_seconds` (histogram): cycle latency
//! - `gateway_registry_services` (gauge): services in the registry
//! - `gateway_pool_events_total` (counter): client groups created/changed/removed
//! - `gateway_admission_wait_seconds` (histogram): time spent waiting for a token
//! - `gateway_rate_limited_total` (counter): requests refused admission
//! - `gateway_requests_total` (counter): dispatched requests by service, status
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::load_balancer::PoolReport;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_refresh(outcome: &'static str, duration: Duration) {
    counter!("gateway_refresh_total", "outcome" => outcome).increment(1);
    histogram!("gateway_refresh_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_registry_size(services: usize) {
    gauge!("gateway_registry_services").set(services as f64);
}

pub fn record_pool_report(report: &PoolReport) {
    counter!("gateway_pool_events_total", "kind" => "created").increment(report.created as u64);
    counter!("gateway_pool_events_total", "kind" => "changed").increment(report.changed as u64);
    counter!("gateway_pool_events_total", "kind" => "removed").increment(report.removed as u64);
}

pub fn record_admission_wait(wait: Duration) {
    histogram!("gateway_admission_wait_seconds").record(wait.as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

pub fn record_request(service: &str, status: u16) {
    counter!(
        "gateway_requests_total",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
