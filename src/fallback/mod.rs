//! Fallback execution subsystem.
//!
//! # Data Flow
//! ```text
//! execute(category, invoker)
//!     → router ranks candidates (once)
//!     → for each candidate:
//!         breaker denies?       → skip, remember CircuitOpen
//!         invoke under timeout  → RequestOutcome
//!         outcome.apply()       → breaker + health updated
//!         success?              → return payload
//!     → AllSourcesExhausted with every reason
//! ```

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::FallbackOrchestrator;
pub use outcome::RequestOutcome;
