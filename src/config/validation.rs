//! Configuration validation.
//!
//! Serde handles syntax; this checks that categories reference configured
//! sources and that timeouts and thresholds are usable. All problems are
//! reported at once.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{BreakerConfig, GatewayConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("category '{category}' lists no sources")]
    EmptyCategory { category: String },

    #[error("category '{category}' references unknown source '{source_id}'")]
    UnknownSource { category: String, source_id: String },

    #[error("category '{category}' lists source '{source_id}' twice")]
    DuplicateSource { category: String, source_id: String },

    #[error("category '{category}' primary '{primary}' is not one of its sources")]
    PrimaryNotCandidate { category: String, primary: String },

    #[error("source '{source_id}' has a zero timeout")]
    ZeroTimeout { source_id: String },

    #[error("source '{source_id}' breaker {field} must be > 0")]
    ZeroThreshold { source_id: String, field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (id, source) in &config.data_sources {
        if source.timeout_ms == 0 {
            errors.push(ValidationError::ZeroTimeout { source_id: id.clone() });
        }
        if let Some(breaker) = &source.breaker {
            check_breaker(id, breaker, &mut errors);
        }
    }

    for (category, cat) in &config.data_categories {
        if cat.sources.is_empty() {
            errors.push(ValidationError::EmptyCategory {
                category: category.clone(),
            });
        }

        let mut seen = HashSet::new();
        for source in &cat.sources {
            if !config.data_sources.contains_key(source) {
                errors.push(ValidationError::UnknownSource {
                    category: category.clone(),
                    source_id: source.clone(),
                });
            }
            if !seen.insert(source.as_str()) {
                errors.push(ValidationError::DuplicateSource {
                    category: category.clone(),
                    source_id: source.clone(),
                });
            }
        }

        if let Some(primary) = &cat.primary {
            if !cat.sources.contains(primary) {
                errors.push(ValidationError::PrimaryNotCandidate {
                    category: category.clone(),
                    primary: primary.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_breaker(source: &str, breaker: &BreakerConfig, errors: &mut Vec<ValidationError>) {
    let fields = [
        ("failure_threshold", breaker.failure_threshold as u64),
        ("success_threshold", breaker.success_threshold as u64),
        ("timeout_secs", breaker.timeout_secs),
        ("half_open_max_calls", breaker.half_open_max_calls as u64),
    ];
    for (field, value) in fields {
        if value == 0 {
            errors.push(ValidationError::ZeroThreshold {
                source_id: source.to_string(),
                field,
            });
        }
    }
}
