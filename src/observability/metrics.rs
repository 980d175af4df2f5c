//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shorturl_requests_total` (counter): requests by outcome and status
//! - `shorturl_request_duration_seconds` (histogram): latency by outcome
//! - `shorturl_management_failures_total` (counter): handler errors by scope
//! - `shorturl_settings_reloads_total` (counter): reloads by result

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start_time: Instant) {
    ::metrics::counter!(
        "shorturl_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("shorturl_request_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_management_failure(scope: &'static str) {
    ::metrics::counter!("shorturl_management_failures_total", "scope" => scope).increment(1);
}

pub fn record_settings_reload(result: &'static str) {
    ::metrics::counter!("shorturl_settings_reloads_total", "result" => result).increment(1);
}
