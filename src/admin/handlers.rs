use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::admin::AdminState;
use crate::error::ConfigurationError;
use crate::gateway::SourceHealth;
use crate::resilience::CircuitState;
use crate::routing::{CachePolicy, Candidate};

type ApiError = (StatusCode, Json<Value>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

fn unknown_source(id: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("unknown source '{}'", id))
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub sources: usize,
    pub categories: usize,
    pub open_breakers: usize,
}

#[derive(Serialize)]
pub struct BestSource {
    pub category: String,
    pub best: String,
    pub fallbacks: Vec<String>,
    pub candidates: Vec<Candidate>,
    pub cache_policy: Option<CachePolicy>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let table = state.gateway.router().table();
    let open_breakers = state
        .gateway
        .breakers()
        .snapshots()
        .iter()
        .filter(|s| s.state != CircuitState::Closed)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open_breakers == 0 { "operational" } else { "degraded" },
        sources: table.sources().len(),
        categories: table.categories().len(),
        open_breakers,
    })
}

pub async fn get_health(State(state): State<AdminState>) -> Json<Vec<SourceHealth>> {
    Json(state.gateway.health_report())
}

pub async fn reset_health(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.gateway.reset_health(&id) {
        return Err(unknown_source(&id));
    }
    Ok(Json(json!({ "source": id, "health": "reset" })))
}

pub async fn reset_all_breakers(State(state): State<AdminState>) -> Json<Value> {
    state.gateway.reset_all_breakers();
    Json(json!({ "breakers": "reset" }))
}

pub async fn reset_breaker(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.gateway.reset_breaker(&id) {
        return Err(unknown_source(&id));
    }
    Ok(Json(json!({ "source": id, "state": CircuitState::Closed })))
}

pub async fn get_best_source(
    State(state): State<AdminState>,
    Path(category): Path<String>,
) -> Result<Json<BestSource>, ApiError> {
    let router = state.gateway.router();
    let candidates = router.candidates(&category).map_err(|e| match e {
        ConfigurationError::UnknownCategory(_) => error(StatusCode::NOT_FOUND, e.to_string()),
        ConfigurationError::NoEnabledSources(_) => error(StatusCode::CONFLICT, e.to_string()),
    })?;

    let best = candidates[0].source.clone();
    let fallbacks = candidates.iter().skip(1).map(|c| c.source.clone()).collect();

    Ok(Json(BestSource {
        cache_policy: router.cache_policy(&category),
        category,
        best,
        fallbacks,
        candidates,
    }))
}

pub async fn enable_source(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    set_enabled(&state, id, true)
}

pub async fn disable_source(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    set_enabled(&state, id, false)
}

fn set_enabled(state: &AdminState, id: String, enabled: bool) -> Result<Json<Value>, ApiError> {
    if !state.gateway.set_source_enabled(&id, enabled) {
        return Err(unknown_source(&id));
    }
    Ok(Json(json!({ "source": id, "enabled": enabled })))
}
