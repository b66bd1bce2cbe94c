//! Market data gateway library.
//!
//! Serves market-data categories from a ranked set of interchangeable
//! providers, falling back across them under per-source circuit breakers and
//! passive health scoring.

pub mod admin;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod source;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, SourceError};
pub use fallback::FallbackOrchestrator;
pub use gateway::{Gateway, SourceHealth};
pub use lifecycle::Shutdown;
pub use source::{DataSource, SourceSet};
