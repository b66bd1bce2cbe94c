//! Breaker registry.
//!
//! # Responsibilities
//! - Hand out the one `CircuitBreaker` per source, creating it on first use
//! - Remember per-source tuning so lazily created breakers get the right thresholds
//! - Bulk reset and status for operators
//!
//! # Design Decisions
//! - `DashMap` shards the map; breakers are `Arc`-cloned out so the shard lock
//!   is never held across a breaker call
//! - Re-tuning applies to breakers created afterwards; a live breaker keeps
//!   its thresholds and its state until it is reset

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus};

/// Process-wide map from source id to its breaker.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    tuning: DashMap<String, CircuitBreakerConfig>,
    default_config: CircuitBreakerConfig,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose untuned sources use `default_config`.
    pub fn with_default(default_config: CircuitBreakerConfig) -> Self {
        Self {
            default_config,
            ..Self::default()
        }
    }

    /// Registry tuned from every configured source.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let registry = Self::new();
        registry.apply_config(config);
        registry
    }

    /// Record tuning for every source in `config`.
    pub fn apply_config(&self, config: &GatewayConfig) {
        for (id, source) in &config.data_sources {
            self.configure(id, CircuitBreakerConfig::from(&source.effective_breaker()));
        }
    }

    /// Set the tuning used when `source`'s breaker is created.
    pub fn configure(&self, source: &str, cfg: CircuitBreakerConfig) {
        self.tuning.insert(source.to_string(), cfg);
    }

    /// The breaker for `source`, created on first use.
    pub fn get(&self, source: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(source) {
            return Arc::clone(existing.value());
        }

        let entry = self.breakers.entry(source.to_string()).or_insert_with(|| {
            let cfg = self
                .tuning
                .get(source)
                .map(|c| c.value().clone())
                .unwrap_or_else(|| self.default_config.clone());
            tracing::debug!(
                source = %source,
                failure_threshold = cfg.failure_threshold,
                timeout_ms = cfg.timeout.as_millis() as u64,
                "Creating circuit breaker"
            );
            Arc::new(CircuitBreaker::new(source, cfg))
        });
        Arc::clone(entry.value())
    }

    /// The breaker for `source` if one has been created.
    pub fn peek(&self, source: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(source).map(|e| Arc::clone(e.value()))
    }

    /// Reset one source's breaker. Returns false if it was never created.
    pub fn reset(&self, source: &str) -> bool {
        match self.breakers.get(source) {
            Some(cb) => {
                cb.reset();
                true
            }
            None => false,
        }
    }

    pub fn reset_all(&self) {
        for cb in self.all() {
            cb.reset();
        }
    }

    /// Status of every breaker created so far, sorted by source.
    pub fn snapshots(&self) -> Vec<CircuitBreakerStatus> {
        let mut out: Vec<_> = self.all().iter().map(|cb| cb.status()).collect();
        out.sort_by(|a, b| a.source.cmp(&b.source));
        out
    }

    fn all(&self) -> Vec<Arc<CircuitBreaker>> {
        self.breakers.iter().map(|e| Arc::clone(e.value())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceClass, SourceConfig};
    use crate::resilience::circuit_breaker::CircuitState;
    use std::time::Duration;

    #[test]
    fn test_same_breaker_per_source() {
        let registry = BreakerRegistry::new();
        let a1 = registry.get("a");
        let a2 = registry.get("a");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &registry.get("b")));
    }

    #[test]
    fn test_peek_does_not_create() {
        let registry = BreakerRegistry::new();
        assert!(registry.peek("a").is_none());
        assert!(registry.snapshots().is_empty());
        let a = registry.get("a");
        assert!(Arc::ptr_eq(&a, &registry.peek("a").unwrap()));
    }

    #[test]
    fn test_tuning_from_config() {
        let mut config = GatewayConfig::default();
        config.data_sources.insert(
            "paid".into(),
            SourceConfig {
                class: SourceClass::Paid,
                ..SourceConfig::default()
            },
        );
        config.data_sources.insert(
            "scraped".into(),
            SourceConfig {
                class: SourceClass::Scraped,
                ..SourceConfig::default()
            },
        );
        let registry = BreakerRegistry::from_config(&config);

        assert_eq!(registry.get("paid").config().failure_threshold, 3);
        assert_eq!(registry.get("paid").config().timeout, Duration::from_secs(30));
        assert_eq!(registry.get("scraped").config().timeout, Duration::from_secs(300));
        // Unknown sources fall back to the registry default.
        assert_eq!(registry.get("other").config(), &CircuitBreakerConfig::default());
    }

    #[test]
    fn test_configure_after_creation_keeps_live_breaker() {
        let registry = BreakerRegistry::with_default(CircuitBreakerConfig::new().with_failure_threshold(2));
        let before = registry.get("a");
        registry.configure("a", CircuitBreakerConfig::new().with_failure_threshold(9));
        assert_eq!(registry.get("a").config().failure_threshold, 2);
        assert!(Arc::ptr_eq(&before, &registry.get("a")));
    }

    #[test]
    fn test_reset() {
        let registry = BreakerRegistry::with_default(CircuitBreakerConfig::new().with_failure_threshold(1));
        registry.get("a").record_failure();
        registry.get("b").record_failure();
        assert_eq!(registry.get("a").state(), CircuitState::Open);

        assert!(registry.reset("a"));
        assert!(!registry.reset("never-seen"));
        assert_eq!(registry.get("a").state(), CircuitState::Closed);
        assert_eq!(registry.get("b").state(), CircuitState::Open);

        registry.reset_all();
        let states: Vec<_> = registry.snapshots().into_iter().map(|s| (s.source, s.state)).collect();
        assert_eq!(
            states,
            vec![("a".to_string(), CircuitState::Closed), ("b".to_string(), CircuitState::Closed)]
        );
    }
}
