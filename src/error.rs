//! Error taxonomy for the data access layer.
//!
//! Two boundaries, two types:
//! - [`SourceError`] is what an adapter returns for a single call. Every
//!   variant counts against the source's breaker and health.
//! - [`GatewayError`] is what a caller of the orchestrator sees. Individual
//!   source failures never surface directly; only exhaustion, a missed overall
//!   deadline, or a configuration problem do.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Failure of one call against one source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Timeout, refused connection, upstream 5xx and the like.
    #[error("transient source error: {0}")]
    Transient(String),

    /// The source answered but the data was empty or malformed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl SourceError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    /// The per-source deadline elapsed before the adapter answered.
    pub fn timeout(after: Duration) -> Self {
        Self::Transient(format!("timed out after {} ms", after.as_millis()))
    }
}

/// Routing configuration cannot serve the category. Never counted against a breaker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    #[error("category '{0}' has no enabled sources")]
    NoEnabledSources(String),
}

/// Why a single candidate did not produce the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Skipped without invoking: breaker denied the call.
    CircuitOpen,
    /// Skipped without invoking: no adapter registered under this id.
    NotRegistered,
    /// Invoked and failed.
    Failed(SourceError),
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            source: source.into(),
            reason,
        }
    }

    /// Whether the source was actually called.
    pub fn was_invoked(&self) -> bool {
        matches!(self.reason, FailureReason::Failed(_))
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FailureReason::CircuitOpen => write!(f, "{}: circuit open", self.source),
            FailureReason::NotRegistered => write!(f, "{}: no adapter registered", self.source),
            FailureReason::Failed(e) => write!(f, "{}: {}", self.source, e),
        }
    }
}

/// Errors surfaced to callers of the fallback orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Every candidate failed or was denied by its breaker.
    #[error("all sources exhausted for '{category}': {}", join_failures(.failures))]
    AllSourcesExhausted {
        category: String,
        failures: Vec<SourceFailure>,
    },

    /// The caller's overall deadline passed before any source succeeded.
    #[error("deadline exceeded for '{category}' after {} attempt(s)", .failures.len())]
    DeadlineExceeded {
        category: String,
        failures: Vec<SourceFailure>,
    },
}

impl GatewayError {
    /// Per-source failure reasons collected before giving up, if any.
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            GatewayError::Configuration(_) => &[],
            GatewayError::AllSourcesExhausted { failures, .. }
            | GatewayError::DeadlineExceeded { failures, .. } => failures,
        }
    }
}

fn join_failures(failures: &[SourceFailure]) -> String {
    if failures.is_empty() {
        return "no candidates".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for orchestrated calls.
pub type GatewayResult<T> = Result<T, GatewayError>;
