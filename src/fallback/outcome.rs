//! Result of a single call attempt.

use std::time::Duration;

use crate::error::SourceError;
use crate::health::HealthRegistry;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::CallPermit;

/// What happened when one source was called once.
///
/// Consumed exactly once: applying it settles the breaker permit and
/// updates health, after which it is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOutcome {
    pub source: String,
    pub category: String,
    pub latency: Duration,
    pub error: Option<SourceError>,
}

impl RequestOutcome {
    pub fn success(source: &str, category: &str, latency: Duration) -> Self {
        Self {
            source: source.to_string(),
            category: category.to_string(),
            latency,
            error: None,
        }
    }

    pub fn failure(source: &str, category: &str, latency: Duration, error: SourceError) -> Self {
        Self {
            source: source.to_string(),
            category: category.to_string(),
            latency,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Fold into the breaker (through its permit) and the health registry.
    ///
    /// Returns the error, if any, so the caller can keep it for diagnostics.
    pub fn apply(self, permit: CallPermit, health: &HealthRegistry) -> Option<SourceError> {
        let success = self.is_success();
        let message = self.error.as_ref().map(ToString::to_string);

        if success {
            permit.success();
        } else {
            permit.failure();
        }
        health.record(&self.source, success, self.latency, message.as_deref());
        metrics::record_source_call(&self.source, success, self.latency);

        self.error
    }
}
