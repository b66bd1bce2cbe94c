//! Admin API exercised in-process.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use market_data_gateway::admin::{setup_admin_router, AdminState};
use market_data_gateway::Gateway;

mod common;

const KEY: &str = "test-admin-key";

fn app() -> (Router, Arc<Gateway>) {
    let gw = Arc::new(common::gateway("quote", &["a", "b"]));
    (setup_admin_router(AdminState::new(Arc::clone(&gw), KEY)), gw)
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {}", KEY))
        .body(Body::empty())
        .unwrap()
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_rejects_missing_or_wrong_key() {
    let (app, _) = app();
    let res = app
        .clone()
        .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            Request::get("/admin/status")
                .header("Authorization", "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_and_health() {
    let (app, gw) = app();
    gw.health().record("a", false, Duration::from_millis(120), Some("HTTP 502"));
    gw.breakers().get("a").force_open();

    let (status, body) = call(app.clone(), request("GET", "/admin/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["sources"], 2);
    assert_eq!(body["open_breakers"], 1);

    let (status, body) = call(app, request("GET", "/admin/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["source"], "a");
    assert_eq!(body[0]["state"], "OPEN");
    assert_eq!(body[0]["last_error"], "HTTP 502");
    assert_eq!(body[1]["state"], "CLOSED");
    assert_eq!(body[1]["health_score"], 100.0);
}

#[tokio::test]
async fn test_breaker_resets() {
    let (app, gw) = app();
    gw.breakers().get("a").force_open();
    gw.breakers().get("b").force_open();

    let (status, body) = call(app.clone(), request("POST", "/admin/breakers/a/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "CLOSED");
    assert_eq!(gw.breakers().get("a").state().to_string(), "CLOSED");
    assert_eq!(gw.breakers().get("b").state().to_string(), "OPEN");

    let (status, _) = call(app.clone(), request("POST", "/admin/breakers/zzz/reset")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(app, request("POST", "/admin/breakers/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gw.breakers().get("b").state().to_string(), "CLOSED");
}

#[tokio::test]
async fn test_health_reset() {
    let (app, gw) = app();
    gw.health().record("b", true, Duration::from_millis(10), None);

    let (status, _) = call(app, request("POST", "/admin/health/b/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gw.health().snapshot("b").total_calls, 0);
}

#[tokio::test]
async fn test_best_source_and_toggles() {
    let (app, _) = app();

    let (status, body) = call(app.clone(), request("GET", "/admin/categories/quote/best")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["best"], "a");
    assert_eq!(body["fallbacks"], serde_json::json!(["b"]));
    assert_eq!(body["cache_policy"]["ttl_secs"], 60);

    let (status, body) = call(app.clone(), request("POST", "/admin/sources/a/disable")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);

    let (_, body) = call(app.clone(), request("GET", "/admin/categories/quote/best")).await;
    assert_eq!(body["best"], "b");

    call(app.clone(), request("POST", "/admin/sources/b/disable")).await;
    let (status, _) = call(app.clone(), request("GET", "/admin/categories/quote/best")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(app.clone(), request("GET", "/admin/categories/news/best")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(app.clone(), request("POST", "/admin/sources/a/enable")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(app, request("GET", "/admin/categories/quote/best")).await;
    assert_eq!(body["best"], "a");
}

#[tokio::test]
async fn test_reloaded_key_replaces_old_one() {
    let gw = Arc::new(common::gateway("quote", &["a", "b"]));
    let state = AdminState::new(gw, KEY);
    let app = setup_admin_router(state.clone());

    state.set_api_key("rotated-key");

    let (status, _) = call(app.clone(), request("GET", "/admin/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::get("/admin/status")
        .header("Authorization", "Bearer rotated-key")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "operational");
}
