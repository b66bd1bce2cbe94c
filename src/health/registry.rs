//! Health registry.
//!
//! # Responsibilities
//! - Fold every completed call into its source's `HealthMetrics`
//! - Answer score and snapshot queries for routing and operators
//!
//! # Design Decisions
//! - Independent of the breakers: a breaker gates calls, the score ranks them
//! - Each update happens under the entry's shard lock, so the call counters
//!   always satisfy total = success + failure
//! - Metrics are only reset by an explicit operator action

use dashmap::DashMap;
use std::time::Duration;

use crate::health::state::{HealthMetrics, OPTIMISTIC_SCORE};

#[derive(Debug, Default)]
pub struct HealthRegistry {
    sources: DashMap<String, HealthMetrics>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call.
    pub fn record(&self, source: &str, success: bool, latency: Duration, error: Option<&str>) {
        let latency_ms = latency.as_secs_f64() * 1_000.0;
        let mut entry = self.sources.entry(source.to_string()).or_default();
        entry.record(success, latency_ms, error);

        tracing::trace!(
            source = %source,
            success,
            latency_ms,
            avg_latency_ms = entry.avg_latency_ms,
            "Health updated"
        );
    }

    /// Health score in [0, 100]; unknown sources get the optimistic default.
    pub fn score(&self, source: &str) -> f64 {
        self.sources
            .get(source)
            .map(|m| m.health_score())
            .unwrap_or(OPTIMISTIC_SCORE)
    }

    /// Copy of the source's metrics (empty if never called).
    pub fn snapshot(&self, source: &str) -> HealthMetrics {
        self.sources
            .get(source)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }

    /// Every source that has recorded at least one call, sorted by id.
    pub fn snapshots(&self) -> Vec<(String, HealthMetrics)> {
        let mut out: Vec<_> = self
            .sources
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Forget a source's history. Returns false if there was none.
    pub fn reset(&self, source: &str) -> bool {
        let removed = self.sources.remove(source).is_some();
        if removed {
            tracing::info!(source = %source, "Health metrics reset");
        }
        removed
    }

    pub fn reset_all(&self) {
        self.sources.clear();
        tracing::info!("All health metrics reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_unknown_source() {
        let registry = HealthRegistry::new();
        assert_eq!(registry.score("nobody"), 100.0);
        assert_eq!(registry.snapshot("nobody"), HealthMetrics::default());
        assert!(registry.snapshots().is_empty());
    }

    #[test]
    fn test_record_and_score() {
        let registry = HealthRegistry::new();
        registry.record("a", false, Duration::from_millis(20), Some("connection refused"));
        assert!(registry.score("a") < 100.0);

        let snap = registry.snapshot("a");
        assert_eq!(snap.total_calls, 1);
        assert_eq!(snap.failure_calls, 1);
        assert_eq!(snap.avg_latency_ms, 20.0);
        assert_eq!(snap.last_error_message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_reset() {
        let registry = HealthRegistry::new();
        registry.record("a", false, Duration::from_millis(5), None);
        registry.record("b", true, Duration::from_millis(5), None);
        assert!(registry.reset("a"));
        assert!(!registry.reset("a"));
        assert_eq!(registry.score("a"), 100.0);
        assert_eq!(registry.snapshots().len(), 1);

        registry.reset_all();
        assert!(registry.snapshots().is_empty());
    }

    #[test]
    fn test_concurrent_writers_keep_totals_consistent() {
        let registry = Arc::new(HealthRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for j in 0..1_000 {
                        let ok = (i + j) % 3 != 0;
                        registry.record("shared", ok, Duration::from_millis(j as u64 % 700), None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = registry.snapshot("shared");
        assert_eq!(snap.total_calls, 8_000);
        assert_eq!(snap.total_calls, snap.success_calls + snap.failure_calls);
    }
}
