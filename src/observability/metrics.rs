//! Metrics collection and exposition.
//!
//! # Metrics
//! - `login_attempts_total` (counter): login outcomes by `outcome`
//! - `rate_limited_total` (counter): rejected attempts by `scope`
//! - `csrf_rejections_total` (counter): failed CSRF verifications
//! - `provider_requests_total` (counter): upstream calls by `endpoint`, `status`
//! - `provider_request_duration_seconds` (histogram): upstream latency
//! - `rate_limit_entries` (gauge): live entries after each sweep

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_login(outcome: &'static str) {
    counter!("login_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_rate_limited(scope: &'static str) {
    counter!("rate_limited_total", "scope" => scope).increment(1);
}

pub fn record_csrf_rejection() {
    counter!("csrf_rejections_total").increment(1);
}

/// `status` 0 means the call never produced a response.
pub fn record_provider_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!(
        "provider_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("provider_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limit_entries(entries: usize) {
    gauge!("rate_limit_entries").set(entries as f64);
}
