//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, store size)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `resource_requests_total` (counter): requests by resource, method, status
//! - `resource_request_duration_seconds` (histogram): latency per resource
//! - `store_entries` (gauge): live entries in the store
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for resource, method, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one evaluated request.
pub fn record_request(resource: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "resource_requests_total",
        "resource" => resource.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "resource_request_duration_seconds",
        "resource" => resource.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Publish the number of live entries.
pub fn record_store_size(live: usize) {
    metrics::gauge!("store_entries").set(live as f64);
}
