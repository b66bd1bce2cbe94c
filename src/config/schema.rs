//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upstream providers keyed by source id.
    pub data_sources: BTreeMap<String, SourceConfig>,

    /// Logical data categories keyed by category id.
    pub data_categories: BTreeMap<String, CategoryConfig>,

    /// Operator API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One upstream data provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Disabled sources are never routed to.
    pub enabled: bool,

    /// Static tie-break between equally healthy sources (lower wins).
    pub priority: u32,

    /// Deadline for a single call against this source, in milliseconds.
    pub timeout_ms: u64,

    /// Provider class; selects breaker defaults when `breaker` is absent.
    pub class: SourceClass,

    /// Explicit breaker tuning for this source.
    pub breaker: Option<BreakerConfig>,
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Breaker tuning in effect for this source.
    pub fn effective_breaker(&self) -> BreakerConfig {
        self.breaker.clone().unwrap_or_else(|| self.class.default_breaker())
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            priority: 100,
            timeout_ms: 5_000,
            class: SourceClass::default(),
            breaker: None,
        }
    }
}

/// Broad provider classes with different failure economics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceClass {
    /// Paid API: trip quickly, retry soon.
    Paid,
    /// Free API.
    #[default]
    Free,
    /// Scraped page: long cooldown so we don't get banned.
    Scraped,
}

impl SourceClass {
    pub fn default_breaker(self) -> BreakerConfig {
        match self {
            SourceClass::Paid => BreakerConfig {
                failure_threshold: 3,
                success_threshold: 2,
                timeout_secs: 30,
                half_open_max_calls: 1,
            },
            SourceClass::Free => BreakerConfig {
                failure_threshold: 5,
                success_threshold: 2,
                timeout_secs: 60,
                half_open_max_calls: 1,
            },
            SourceClass::Scraped => BreakerConfig {
                failure_threshold: 5,
                success_threshold: 3,
                timeout_secs: 300,
                half_open_max_calls: 1,
            },
        }
    }
}

/// Circuit breaker tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Consecutive half-open successes that close it again.
    pub success_threshold: u32,

    /// Time the circuit stays open before probing, in seconds.
    pub timeout_secs: u64,

    /// Trials granted while half-open.
    pub half_open_max_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        SourceClass::Free.default_breaker()
    }
}

/// One logical data category.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Candidate sources, in configured order.
    pub sources: Vec<String>,

    /// How long a cached answer for this category stays fresh, in seconds.
    pub cache_ttl_secs: u64,

    /// Storage tier for cached answers.
    pub cache_level: CacheLevel,

    /// Source always tried first while it is enabled.
    pub primary: Option<String>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            cache_ttl_secs: 60,
            cache_level: CacheLevel::default(),
            primary: None,
        }
    }
}

/// Cache storage tier advertised to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheLevel {
    #[default]
    Memory,
    Redis,
    Disk,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
