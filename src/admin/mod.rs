//! Operator HTTP surface.
//!
//! # Routes
//! ```text
//! GET  /admin/status                  version and counts
//! GET  /admin/health                  per-source health report
//! POST /admin/health/{id}/reset       clear one source's health history
//! POST /admin/breakers/reset          reset every breaker
//! POST /admin/breakers/{id}/reset     reset one breaker
//! GET  /admin/categories/{id}/best    routing decision without executing
//! POST /admin/sources/{id}/enable     runtime toggle until next reload
//! POST /admin/sources/{id}/disable
//! ```
//!
//! Every route requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::gateway::Gateway;

/// Upper bound on any admin request.
const ADMIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state of the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub gateway: Arc<Gateway>,
    /// Swapped in place on config reload; clones share it.
    pub api_key: Arc<ArcSwap<String>>,
}

impl AdminState {
    pub fn new(gateway: Arc<Gateway>, api_key: impl Into<String>) -> Self {
        Self {
            gateway,
            api_key: Arc::new(ArcSwap::from_pointee(api_key.into())),
        }
    }

    /// Replace the bearer token. Requests already past auth are unaffected.
    pub fn set_api_key(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        if **self.api_key.load() != api_key {
            self.api_key.store(Arc::new(api_key));
            tracing::info!("Admin API key rotated");
        }
    }
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/health", get(get_health))
        .route("/admin/health/{id}/reset", post(reset_health))
        .route("/admin/breakers/reset", post(reset_all_breakers))
        .route("/admin/breakers/{id}/reset", post(reset_breaker))
        .route("/admin/categories/{id}/best", get(get_best_source))
        .route("/admin/sources/{id}/enable", post(enable_source))
        .route("/admin/sources/{id}/disable", post(disable_source))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
        .layer(TimeoutLayer::new(ADMIN_REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}
