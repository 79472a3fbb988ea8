//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by service, status
//! - `relay_request_duration_seconds` (histogram): handler latency by service
//! - `relay_bytes_streamed_total` (counter): bytes forwarded downstream by the relay
//! - `relay_upstream_errors_total` (counter): upstream failures by kind
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);

    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(service: &'static str, status: u16, start: Instant) {
    counter!(
        "relay_requests_total",
        "service" => service,
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("relay_request_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_bytes_streamed(bytes: u64) {
    counter!("relay_bytes_streamed_total").increment(bytes);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}
