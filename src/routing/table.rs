//! Immutable routing snapshot.
//!
//! A `RoutingTable` is built once from a `GatewayConfig` and never mutated in
//! place; changes produce a new table that the router publishes with a single
//! pointer swap.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::{CacheLevel, GatewayConfig, SourceClass};

/// Routing view of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub id: String,
    pub enabled: bool,
    pub priority: u32,
    #[serde(rename = "timeout_ms", serialize_with = "as_millis")]
    pub timeout: Duration,
    pub class: SourceClass,
}

/// Caching hints callers attach to answers for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CachePolicy {
    #[serde(rename = "ttl_secs", serialize_with = "as_secs")]
    pub ttl: Duration,
    pub level: CacheLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEntry {
    pub id: String,
    /// Candidates in configured order.
    pub sources: Vec<String>,
    pub cache_policy: CachePolicy,
    pub primary: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    sources: HashMap<String, SourceEntry>,
    categories: HashMap<String, CategoryEntry>,
}

impl RoutingTable {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let sources = config
            .data_sources
            .iter()
            .map(|(id, s)| {
                let entry = SourceEntry {
                    id: id.clone(),
                    enabled: s.enabled,
                    priority: s.priority,
                    timeout: s.timeout(),
                    class: s.class,
                };
                (id.clone(), entry)
            })
            .collect();

        let categories = config
            .data_categories
            .iter()
            .map(|(id, c)| {
                let entry = CategoryEntry {
                    id: id.clone(),
                    sources: c.sources.clone(),
                    cache_policy: CachePolicy {
                        ttl: Duration::from_secs(c.cache_ttl_secs),
                        level: c.cache_level,
                    },
                    primary: c.primary.clone(),
                };
                (id.clone(), entry)
            })
            .collect();

        Self { sources, categories }
    }

    pub fn source(&self, id: &str) -> Option<&SourceEntry> {
        self.sources.get(id)
    }

    pub fn category(&self, id: &str) -> Option<&CategoryEntry> {
        self.categories.get(id)
    }

    /// All sources, sorted by id.
    pub fn sources(&self) -> Vec<&SourceEntry> {
        let mut out: Vec<_> = self.sources.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All categories, sorted by id.
    pub fn categories(&self) -> Vec<&CategoryEntry> {
        let mut out: Vec<_> = self.categories.values().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Copy of this table with one source's `enabled` flag changed.
    pub fn with_source_enabled(&self, id: &str, enabled: bool) -> Self {
        let mut next = self.clone();
        if let Some(entry) = next.sources.get_mut(id) {
            entry.enabled = enabled;
        }
        next
    }
}

pub(crate) fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}
