//! Category routing.
//!
//! # Responsibilities
//! - Map a category to its enabled candidate sources
//! - Rank candidates by health score, then static priority
//! - Publish configuration changes without readers ever seeing a half-built table
//!
//! # Design Decisions
//! - The table lives behind `ArcSwap`; every query loads one snapshot and
//!   ranks against it, so a concurrent reload cannot mix old and new entries
//! - Scores are read once per ranking, not inside the comparator
//! - A configured `primary` that is enabled always goes first
//! - No enabled candidates is a configuration error, not a transient failure

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::ConfigurationError;
use crate::health::HealthRegistry;
use crate::routing::table::{CachePolicy, RoutingTable};

/// One ranked candidate for a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub source: String,
    #[serde(rename = "timeout_ms", serialize_with = "crate::routing::table::as_millis")]
    pub timeout: Duration,
    pub priority: u32,
    /// Health score at ranking time.
    pub score: f64,
}

#[derive(Debug)]
pub struct CategoryRouter {
    table: ArcSwap<RoutingTable>,
    health: Arc<HealthRegistry>,
}

impl CategoryRouter {
    pub fn new(table: RoutingTable, health: Arc<HealthRegistry>) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            health,
        }
    }

    pub fn from_config(config: &GatewayConfig, health: Arc<HealthRegistry>) -> Self {
        Self::new(RoutingTable::from_config(config), health)
    }

    /// Current routing snapshot.
    pub fn table(&self) -> Arc<RoutingTable> {
        self.table.load_full()
    }

    /// Replace the routing table from a new configuration.
    ///
    /// Runtime enable/disable toggles are superseded by the file.
    pub fn reload(&self, config: &GatewayConfig) {
        let next = RoutingTable::from_config(config);
        tracing::info!(
            sources = config.data_sources.len(),
            categories = config.data_categories.len(),
            "Routing table reloaded"
        );
        self.table.store(Arc::new(next));
    }

    /// Enable or disable a source at runtime. Returns false for unknown sources.
    pub fn set_source_enabled(&self, source: &str, enabled: bool) -> bool {
        if self.table.load().source(source).is_none() {
            return false;
        }
        self.table
            .rcu(|current| current.with_source_enabled(source, enabled));
        tracing::info!(source = %source, enabled, "Source availability changed");
        true
    }

    /// Enabled candidates for `category`, best first.
    pub fn candidates(&self, category: &str) -> Result<Vec<Candidate>, ConfigurationError> {
        let table = self.table.load();
        let entry = table
            .category(category)
            .ok_or_else(|| ConfigurationError::UnknownCategory(category.to_string()))?;

        let mut ranked: Vec<Candidate> = entry
            .sources
            .iter()
            .filter_map(|id| table.source(id))
            .filter(|s| s.enabled)
            .map(|s| Candidate {
                source: s.id.clone(),
                timeout: s.timeout,
                priority: s.priority,
                score: self.health.score(&s.id),
            })
            .collect();

        if ranked.is_empty() {
            return Err(ConfigurationError::NoEnabledSources(category.to_string()));
        }

        // Stable: equal score and priority keep configured order.
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.priority.cmp(&b.priority))
        });

        if let Some(primary) = &entry.primary {
            if let Some(pos) = ranked.iter().position(|c| &c.source == primary) {
                let head = ranked.remove(pos);
                ranked.insert(0, head);
            }
        }

        Ok(ranked)
    }

    /// The source a call for `category` should try first.
    pub fn best_source(&self, category: &str) -> Option<String> {
        self.candidates(category)
            .ok()
            .and_then(|c| c.into_iter().next())
            .map(|c| c.source)
    }

    /// Ranked candidates for `category` other than those in `exclude`.
    ///
    /// `fallback_sources(c, &[best])` is the remainder after `best_source(c)`.
    pub fn fallback_sources(&self, category: &str, exclude: &[&str]) -> Vec<String> {
        self.candidates(category)
            .unwrap_or_default()
            .into_iter()
            .map(|c| c.source)
            .filter(|s| !exclude.contains(&s.as_str()))
            .collect()
    }

    pub fn cache_policy(&self, category: &str) -> Option<CachePolicy> {
        self.table.load().category(category).map(|c| c.cache_policy)
    }
}
