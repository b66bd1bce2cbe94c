//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (breaker transitions, fallback steps, reloads)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (source, category, state) on every event
//! - Metric calls are no-ops until a recorder is installed, so the library
//!   works standalone and in tests

pub mod logging;
pub mod metrics;
