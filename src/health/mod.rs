//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a source completes (success or failure, with latency)
//!     → registry.rs (find the source's entry)
//!     → state.rs (update counters and latency EWMA)
//!
//! Routing asks for a ranking:
//!     → registry.rs score(source)
//!     → state.rs health_score()
//! ```
//!
//! # Design Decisions
//! - Passive only: health comes from real traffic, not synthetic checks
//! - Untested sources score 100 so they get tried
//! - Latency is an EWMA so no per-call history is stored

pub mod registry;
pub mod state;

pub use registry::HealthRegistry;
pub use state::HealthMetrics;
