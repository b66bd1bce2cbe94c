//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Category lookup ("realtime_quote")
//!     → router.rs (load current table snapshot)
//!     → table.rs (category's configured candidates)
//!     → filter enabled, rank by health score then priority
//!     → Return: ranked candidates or a configuration error
//!
//! Table compilation (startup and reload):
//!     GatewayConfig
//!     → RoutingTable (immutable)
//!     → swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; changes build a new one
//! - Deterministic: same table and scores always give the same order
//! - Explicit configuration error rather than an empty list

pub mod router;
pub mod table;

pub use router::{Candidate, CategoryRouter};
pub use table::{CachePolicy, CategoryEntry, RoutingTable, SourceEntry};
