//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use market_data_gateway::config::{parse_config, GatewayConfig};
use market_data_gateway::{DataSource, Gateway, SourceError};

/// Config with `sources` (priority in listed order) all serving `category`.
pub fn single_category_config(category: &str, sources: &[&str]) -> GatewayConfig {
    let mut toml = String::new();
    for (i, id) in sources.iter().enumerate() {
        toml.push_str(&format!("[data_sources.{}]\npriority = {}\n", id, i + 1));
    }
    let list = sources
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ");
    toml.push_str(&format!("[data_categories.{}]\nsources = [{}]\n", category, list));
    parse_config(&toml).unwrap()
}

pub fn gateway(category: &str, sources: &[&str]) -> Gateway {
    Gateway::from_config(&single_category_config(category, sources))
}

/// What a scripted source does on one call.
#[derive(Debug, Clone)]
pub enum Step {
    Ok(f64),
    Fail(&'static str),
    Hang,
    Slow(Duration, f64),
}

/// A `DataSource` that replays a script, then repeats `fallback` forever.
pub struct ScriptedSource {
    id: String,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicU32,
}

impl ScriptedSource {
    pub fn new(id: &str, fallback: Step) -> Arc<Self> {
        Self::with_script(id, Vec::new(), fallback)
    }

    pub fn with_script(id: &str, script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    type Request = String;
    type Response = f64;

    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, _symbol: &String) -> Result<f64, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Ok(price) => Ok(price),
            Step::Fail(msg) => Err(SourceError::transient(msg)),
            Step::Hang => std::future::pending().await,
            Step::Slow(d, price) => {
                tokio::time::sleep(d).await;
                Ok(price)
            }
        }
    }
}

/// `DataSource` wrapper so an `Arc<ScriptedSource>` can be registered while
/// the test keeps its own handle for call counts.
pub struct Shared(pub Arc<ScriptedSource>);

#[async_trait]
impl DataSource for Shared {
    type Request = String;
    type Response = f64;

    fn id(&self) -> &str {
        self.0.id()
    }

    async fn fetch(&self, symbol: &String) -> Result<f64, SourceError> {
        self.0.fetch(symbol).await
    }
}
