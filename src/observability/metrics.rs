//! Metrics collection and exposition.
//!
//! # Metrics
//! - `payment_attempts_total` (counter): classified calls by provider, outcome
//! - `payment_outcomes_total` (counter): terminal states by provider, state
//! - `payment_call_duration_seconds` (histogram): provider round-trip latency
//! - `payment_adaptive_timeout_ms` (gauge): current per-call timeout
//! - `payment_admission_rejected_total` (counter): refusals by reason
//! - `payment_inflight_calls` (gauge): concurrency slots held

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_attempt(provider: &str, outcome: &'static str, latency: Duration) {
    counter!("payment_attempts_total", "provider" => provider.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("payment_call_duration_seconds", "provider" => provider.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_outcome(provider: &str, state: &'static str) {
    counter!("payment_outcomes_total", "provider" => provider.to_string(), "state" => state)
        .increment(1);
}

pub fn record_adaptive_timeout(provider: &str, timeout_ms: u64) {
    gauge!("payment_adaptive_timeout_ms", "provider" => provider.to_string())
        .set(timeout_ms as f64);
}

pub fn record_admission_rejected(provider: &str, reason: &'static str) {
    counter!("payment_admission_rejected_total", "provider" => provider.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_inflight(provider: &str, in_flight: usize) {
    gauge!("payment_inflight_calls", "provider" => provider.to_string()).set(in_flight as f64);
}
