//! Per-source health metrics and the health score.
//!
//! # Score
//! ```text
//! score = success_rate * 60 + latency_points
//!
//! latency_points (from the EWMA latency):
//!     < 100 ms  → 40
//!     < 500 ms  → 30
//!     < 1000 ms → 20
//!     otherwise → 10
//!
//! no calls yet → 100
//! ```
//!
//! Success rate dominates; latency only separates sources that are about
//! equally reliable. The score is monotonic in success rate and in inverse
//! latency, and nothing stronger should be read into the constants.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Weight of the success rate in the score.
pub const SUCCESS_WEIGHT: f64 = 60.0;

/// Score of a source that has never been called.
pub const OPTIMISTIC_SCORE: f64 = 100.0;

/// Smoothing factor for the latency EWMA (weight of the newest sample).
pub const LATENCY_ALPHA: f64 = 0.1;

/// Latency component of the score, out of 40.
pub fn latency_points(avg_latency_ms: f64) -> f64 {
    if avg_latency_ms < 100.0 {
        40.0
    } else if avg_latency_ms < 500.0 {
        30.0
    } else if avg_latency_ms < 1000.0 {
        20.0
    } else {
        10.0
    }
}

/// Aggregated call outcomes for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthMetrics {
    pub total_calls: u64,
    pub success_calls: u64,
    pub failure_calls: u64,
    /// Exponentially weighted, not a plain mean.
    pub avg_latency_ms: f64,
    /// Unix epoch milliseconds.
    pub last_success_at: Option<u64>,
    /// Unix epoch milliseconds.
    pub last_failure_at: Option<u64>,
    pub last_error_message: Option<String>,
}

impl HealthMetrics {
    /// Fold one completed call into the aggregate.
    pub fn record(&mut self, success: bool, latency_ms: f64, error: Option<&str>) {
        self.total_calls += 1;
        let now = now_millis();
        if success {
            self.success_calls += 1;
            self.last_success_at = Some(now);
        } else {
            self.failure_calls += 1;
            self.last_failure_at = Some(now);
            if let Some(msg) = error {
                self.last_error_message = Some(msg.to_string());
            }
        }

        self.avg_latency_ms = if self.avg_latency_ms == 0.0 {
            latency_ms
        } else {
            self.avg_latency_ms * (1.0 - LATENCY_ALPHA) + latency_ms * LATENCY_ALPHA
        };
    }

    /// Fraction of successful calls; 1.0 before the first call.
    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            1.0
        } else {
            self.success_calls as f64 / self.total_calls as f64
        }
    }

    /// Health score in [0, 100].
    pub fn health_score(&self) -> f64 {
        if self.total_calls == 0 {
            return OPTIMISTIC_SCORE;
        }
        self.success_rate() * SUCCESS_WEIGHT + latency_points(self.avg_latency_ms)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
