//! Config file loading and applying a reload to a live gateway.

use std::time::Duration;

use market_data_gateway::config::{load_config, ConfigError};
use market_data_gateway::resilience::CircuitState;
use market_data_gateway::{Gateway, SourceError};

mod common;

const INITIAL: &str = r#"
[data_sources.tushare]
priority = 1
class = "paid"

[data_sources.akshare]
priority = 2
class = "scraped"

[data_categories.daily_kline]
sources = ["tushare", "akshare"]
cache_ttl_secs = 3600
cache_level = "disk"

[admin]
api_key = "k"
"#;

fn write(file: &tempfile::NamedTempFile, content: &str) {
    std::fs::write(file.path(), content).unwrap();
}

#[tokio::test]
async fn test_reload_swaps_routing_and_keeps_state() {
    let file = tempfile::NamedTempFile::new().unwrap();
    write(&file, INITIAL);

    let gw = Gateway::from_config(&load_config(file.path()).unwrap());
    assert_eq!(gw.breakers().get("tushare").config().failure_threshold, 3);
    assert_eq!(
        gw.router().cache_policy("daily_kline").unwrap().ttl,
        Duration::from_secs(3600)
    );

    gw.breakers().get("tushare").force_open();
    gw.health().record("akshare", true, Duration::from_millis(300), None);

    write(
        &file,
        &INITIAL.replace("[data_sources.akshare]\npriority = 2", "[data_sources.akshare]\npriority = 2\nenabled = false"),
    );
    gw.apply_config(&load_config(file.path()).unwrap());

    // Routing follows the file; breaker and health history survive.
    assert_eq!(gw.best_source("daily_kline").as_deref(), Some("tushare"));
    assert_eq!(gw.breakers().get("tushare").state(), CircuitState::Open);
    assert_eq!(gw.health().snapshot("akshare").total_calls, 1);

    let err = gw
        .execute("daily_kline", |_| async { Ok::<_, SourceError>(()) })
        .await
        .unwrap_err();
    assert_eq!(err.failures().len(), 1);
}

#[test]
fn test_invalid_file_reports_every_problem() {
    let file = tempfile::NamedTempFile::new().unwrap();
    write(
        &file,
        r#"
        [data_sources.a]
        timeout_ms = 0

        [data_categories.quote]
        sources = ["a", "ghost"]
        primary = "other"
        "#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => assert!(errors.len() >= 3, "{errors:?}"),
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_helper_config_is_valid() {
    let config = common::single_category_config("quote", &["x", "y", "z"]);
    assert_eq!(config.data_sources["z"].priority, 3);
    assert_eq!(config.data_categories["quote"].sources, vec!["x", "y", "z"]);
}
