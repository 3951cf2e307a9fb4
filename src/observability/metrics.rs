//! Metrics collection and exposition.
//!
//! # Metrics
//! - `camo_requests_total` (counter): proxy requests by outcome
//! - `camo_upstream_duration_seconds` (histogram): upstream fetch latency by result
//! - `camo_rewrites_total` (counter): content bodies passed through the rewriter
//! - `camo_rewritten_images_total` (counter): image sources replaced
//!
//! Without an installed recorder every call is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str) {
    ::metrics::counter!("camo_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream(duration: Duration, success: bool) {
    let result = if success { "ok" } else { "error" };
    ::metrics::histogram!("camo_upstream_duration_seconds", "result" => result)
        .record(duration.as_secs_f64());
}

pub fn record_rewrite(images: usize) {
    ::metrics::counter!("camo_rewrites_total").increment(1);
    ::metrics::counter!("camo_rewritten_images_total").increment(images as u64);
}
