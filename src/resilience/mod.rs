//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a source:
//!     → registry.rs (look up the source's breaker, create on first use)
//!     → circuit_breaker.rs (may we call it right now?)
//!     → timeouts.rs (enforce the source's deadline)
//!     → circuit_breaker.rs (record success or failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every source call has a deadline
//! - No retries against the same source; recovery means moving to the next one
//! - Breakers are per source, never global

pub mod circuit_breaker;
pub mod registry;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStatus, CircuitState};
pub use registry::BreakerRegistry;
