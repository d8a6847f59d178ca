//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, cache outcomes, uploads, side tasks)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_cache_lookups_total` (counter): by endpoint, outcome (hit/miss/error)
//! - `gateway_cache_write_failures_total` (counter): by endpoint
//! - `gateway_uploads_total` (counter): by outcome
//! - `gateway_upload_bytes_total` / `gateway_upload_chunks_total` (counters)
//! - `gateway_background_tasks_total` (counter): by task, outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder (tests) every call is a no-op

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(endpoint: &'static str, outcome: &'static str) {
    counter!("gateway_cache_lookups_total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
}

pub fn record_cache_write_failure(endpoint: &'static str) {
    counter!("gateway_cache_write_failures_total", "endpoint" => endpoint).increment(1);
}

pub fn record_upload(outcome: &'static str, bytes: u64, chunks: u64) {
    counter!("gateway_uploads_total", "outcome" => outcome).increment(1);
    counter!("gateway_upload_bytes_total").increment(bytes);
    counter!("gateway_upload_chunks_total").increment(chunks);
}

pub fn record_background_task(task: &'static str, outcome: &'static str) {
    counter!("gateway_background_tasks_total", "task" => task, "outcome" => outcome)
        .increment(1);
}
