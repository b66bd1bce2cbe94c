//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_source_calls_total` (counter): calls by source, outcome
//! - `gateway_source_latency_seconds` (histogram): call latency by source
//! - `gateway_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_breaker_skips_total` (counter): candidates skipped by an open breaker
//! - `gateway_fallbacks_total` (counter): executions that needed more than one candidate
//! - `gateway_exhausted_total` (counter): executions where every candidate failed

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and start its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_source_call(source: &str, success: bool, latency: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "gateway_source_calls_total",
        "source" => source.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("gateway_source_latency_seconds", "source" => source.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_breaker_state(source: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    gauge!("gateway_breaker_state", "source" => source.to_string()).set(value);
}

pub fn record_breaker_skip(source: &str) {
    counter!("gateway_breaker_skips_total", "source" => source.to_string()).increment(1);
}

pub fn record_fallback(category: &str) {
    counter!("gateway_fallbacks_total", "category" => category.to_string()).increment(1);
}

pub fn record_exhausted(category: &str) {
    counter!("gateway_exhausted_total", "category" => category.to_string()).increment(1);
}
