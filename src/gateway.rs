//! The explicitly constructed bundle of shared components.
//!
//! A `Gateway` owns one router, one breaker registry and one health registry
//! and hands the orchestrator `Arc`s to the same instances. Tests build as many
//! independent gateways as they like; nothing here is global.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::error::{GatewayResult, SourceError};
use crate::fallback::FallbackOrchestrator;
use crate::health::HealthRegistry;
use crate::resilience::{BreakerRegistry, CircuitState};
use crate::routing::CategoryRouter;
use crate::source::SourceSet;

/// Operator view of one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceHealth {
    pub source: String,
    pub state: CircuitState,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub health_score: f64,
    pub total_calls: u64,
    pub last_error: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Gateway {
    router: Arc<CategoryRouter>,
    breakers: Arc<BreakerRegistry>,
    health: Arc<HealthRegistry>,
    orchestrator: FallbackOrchestrator,
}

impl Gateway {
    pub fn new(
        router: Arc<CategoryRouter>,
        breakers: Arc<BreakerRegistry>,
        health: Arc<HealthRegistry>,
    ) -> Self {
        let orchestrator =
            FallbackOrchestrator::new(Arc::clone(&router), Arc::clone(&breakers), Arc::clone(&health));
        Self {
            router,
            breakers,
            health,
            orchestrator,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let health = Arc::new(HealthRegistry::new());
        let breakers = Arc::new(BreakerRegistry::from_config(config));
        let router = Arc::new(CategoryRouter::from_config(config, Arc::clone(&health)));
        Self::new(router, breakers, health)
    }

    /// Apply a reloaded configuration.
    ///
    /// Breaker and health state survive; new breaker tuning only reaches
    /// breakers created from now on.
    pub fn apply_config(&self, config: &GatewayConfig) {
        self.breakers.apply_config(config);
        self.router.reload(config);
    }

    pub fn router(&self) -> &Arc<CategoryRouter> {
        &self.router
    }

    pub fn breakers(&self) -> &Arc<BreakerRegistry> {
        &self.breakers
    }

    pub fn health(&self) -> &Arc<HealthRegistry> {
        &self.health
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    /// Shorthand for [`FallbackOrchestrator::execute`].
    pub async fn execute<T, F, Fut>(&self, category: &str, invoker: F) -> GatewayResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        self.orchestrator.execute(category, invoker).await
    }

    /// Shorthand for [`FallbackOrchestrator::execute_sources`].
    pub async fn execute_sources<Req: Sync, Resp: Send>(
        &self,
        category: &str,
        sources: &SourceSet<Req, Resp>,
        request: &Req,
    ) -> GatewayResult<Resp> {
        self.orchestrator
            .execute_sources(category, sources, request)
            .await
    }

    pub fn best_source(&self, category: &str) -> Option<String> {
        self.router.best_source(category)
    }

    /// Per-source snapshot for every configured source, sorted by id.
    ///
    /// Sources without a breaker yet report `CLOSED`.
    pub fn health_report(&self) -> Vec<SourceHealth> {
        let table = self.router.table();
        table
            .sources()
            .into_iter()
            .map(|entry| {
                let metrics = self.health.snapshot(&entry.id);
                let state = self
                    .breakers
                    .peek(&entry.id)
                    .map(|cb| cb.state())
                    .unwrap_or(CircuitState::Closed);
                SourceHealth {
                    source: entry.id.clone(),
                    state,
                    success_rate: metrics.success_rate(),
                    avg_latency_ms: metrics.avg_latency_ms,
                    health_score: metrics.health_score(),
                    total_calls: metrics.total_calls,
                    last_error: metrics.last_error_message,
                    enabled: entry.enabled,
                }
            })
            .collect()
    }

    /// Reset one source's breaker. Returns false if the source is unknown.
    pub fn reset_breaker(&self, source: &str) -> bool {
        if self.router.table().source(source).is_none() {
            return false;
        }
        self.breakers.reset(source);
        tracing::info!(source = %source, "Breaker reset by operator");
        true
    }

    pub fn reset_all_breakers(&self) {
        self.breakers.reset_all();
        tracing::info!("All breakers reset by operator");
    }

    /// Clear one source's health history. Returns false if the source is unknown.
    pub fn reset_health(&self, source: &str) -> bool {
        if self.router.table().source(source).is_none() {
            return false;
        }
        self.health.reset(source);
        tracing::info!(source = %source, "Health metrics reset by operator");
        true
    }

    /// Enable or disable a source until the next reload.
    pub fn set_source_enabled(&self, source: &str, enabled: bool) -> bool {
        self.router.set_source_enabled(source, enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::time::Duration;

    fn gateway() -> Gateway {
        Gateway::from_config(
            &parse_config(
                r#"
                [data_sources.a]
                priority = 1
                class = "paid"
                [data_sources.b]
                priority = 2
                [data_categories.quote]
                sources = ["a", "b"]
                "#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_health_report_covers_configured_sources() {
        let gw = gateway();
        gw.health().record("a", false, Duration::from_millis(200), Some("HTTP 503"));

        let report = gw.health_report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].source, "a");
        assert_eq!(report[0].total_calls, 1);
        assert_eq!(report[0].success_rate, 0.0);
        assert_eq!(report[0].last_error.as_deref(), Some("HTTP 503"));
        assert_eq!(report[0].state, CircuitState::Closed);
        assert_eq!(report[1].health_score, 100.0);
        // Reporting creates no breakers.
        assert!(gw.breakers().snapshots().is_empty());
    }

    #[test]
    fn test_reset_helpers() {
        let gw = gateway();
        for _ in 0..3 {
            gw.breakers().get("a").record_failure();
        }
        gw.health().record("a", false, Duration::from_millis(5), None);
        assert_eq!(gw.health_report()[0].state, CircuitState::Open);

        assert!(gw.reset_breaker("a"));
        assert!(!gw.reset_breaker("zzz"));
        assert_eq!(gw.health_report()[0].state, CircuitState::Closed);

        assert!(gw.reset_health("a"));
        assert_eq!(gw.health_report()[0].total_calls, 0);
    }

    #[tokio::test]
    async fn test_disabled_source_is_not_called() {
        let gw = gateway();
        assert!(gw.set_source_enabled("a", false));
        assert_eq!(gw.best_source("quote").as_deref(), Some("b"));

        let served = gw
            .execute("quote", |id| async move { Ok::<_, SourceError>(id) })
            .await
            .unwrap();
        assert_eq!(served, "b");
        assert!(!gw.health_report()[0].enabled);
    }

    #[test]
    fn test_apply_config_keeps_health() {
        let gw = gateway();
        gw.health().record("a", true, Duration::from_millis(5), None);
        gw.set_source_enabled("a", false);

        gw.apply_config(
            &parse_config(
                r#"
                [data_sources.a]
                [data_categories.quote]
                sources = ["a"]
                "#,
            )
            .unwrap(),
        );

        let report = gw.health_report();
        assert_eq!(report.len(), 1);
        assert!(report[0].enabled);
        assert_eq!(report[0].total_calls, 1);
    }
}
