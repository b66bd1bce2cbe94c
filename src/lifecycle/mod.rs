//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Ctrl+C (signals.rs) → Shutdown::trigger → every subscriber returns
//!         → admin server drains
//!         → config reload loop exits
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; tasks subscribe before they start
//! - The gateway itself holds no background tasks, so nothing else to stop

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_ctrl_c;
