//! Adapter seam.
//!
//! The gateway never knows how a provider is called. Adapters implement
//! [`DataSource`] and are registered once at startup in a [`SourceSet`]; the
//! orchestrator looks them up by id and treats them uniformly.
//!
//! A set serves one request/response shape. Applications with several shapes
//! (quotes, statements, news) build one set per shape, or make the shape an
//! enum.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SourceError;

/// One upstream provider.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Request: Sync;
    type Response: Send;

    /// Stable id matching the `data_sources` key in configuration.
    fn id(&self) -> &str;

    /// Perform the provider call.
    ///
    /// Empty or malformed answers should be returned as
    /// [`SourceError::InvalidPayload`], not `Ok`.
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, SourceError>;
}

type DynSource<Req, Resp> = Arc<dyn DataSource<Request = Req, Response = Resp>>;

/// Adapters registered for one request/response shape.
pub struct SourceSet<Req, Resp> {
    sources: HashMap<String, DynSource<Req, Resp>>,
}

impl<Req, Resp> SourceSet<Req, Resp> {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register an adapter under its own id, replacing any previous one.
    pub fn register<S>(&mut self, source: S) -> &mut Self
    where
        S: DataSource<Request = Req, Response = Resp> + 'static,
    {
        let id = source.id().to_string();
        if self.sources.insert(id.clone(), Arc::new(source)).is_some() {
            tracing::warn!(source = %id, "Replacing previously registered adapter");
        }
        self
    }

    pub fn with<S>(mut self, source: S) -> Self
    where
        S: DataSource<Request = Req, Response = Resp> + 'static,
    {
        self.register(source);
        self
    }

    pub fn get(&self, id: &str) -> Option<&DynSource<Req, Resp>> {
        self.sources.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<Req, Resp> Default for SourceSet<Req, Resp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req, Resp> fmt::Debug for SourceSet<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.sources.keys().collect();
        ids.sort();
        f.debug_struct("SourceSet").field("sources", &ids).finish()
    }
}
