//! Fallback orchestration.
//!
//! # Responsibilities
//! - Rank a category's candidates once, at the start of a call
//! - Skip candidates whose breaker denies the call
//! - Call the rest in order under their own timeout until one succeeds
//! - Record every real attempt into breaker and health
//! - Report exhaustion with every per-source reason attached
//!
//! # Design Decisions
//! - Holds no mutable state; any number of executions may run concurrently
//! - The order computed at the start is kept for the whole execution even if
//!   scores move underneath it
//! - A candidate cut short by the caller's overall deadline is not recorded:
//!   the source never got its full timeout

use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{FailureReason, GatewayError, GatewayResult, SourceError, SourceFailure};
use crate::fallback::outcome::RequestOutcome;
use crate::health::HealthRegistry;
use crate::observability::metrics;
use crate::resilience::timeouts::{call_with_deadline, Bounded};
use crate::resilience::BreakerRegistry;
use crate::routing::CategoryRouter;
use crate::source::SourceSet;

/// Ties router, breakers and health together for one call at a time.
#[derive(Debug, Clone)]
pub struct FallbackOrchestrator {
    router: Arc<CategoryRouter>,
    breakers: Arc<BreakerRegistry>,
    health: Arc<HealthRegistry>,
}

impl FallbackOrchestrator {
    pub fn new(
        router: Arc<CategoryRouter>,
        breakers: Arc<BreakerRegistry>,
        health: Arc<HealthRegistry>,
    ) -> Self {
        Self {
            router,
            breakers,
            health,
        }
    }

    /// Serve `category` by calling `invoker(source_id)` on candidates in order.
    pub async fn execute<T, F, Fut>(&self, category: &str, invoker: F) -> GatewayResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        self.run(category, None, invoker, |_: &T| true, |_: &str| true)
            .await
    }

    /// Like [`execute`](Self::execute), treating payloads rejected by `validate`
    /// as [`SourceError::InvalidPayload`].
    pub async fn execute_validated<T, F, Fut, V>(
        &self,
        category: &str,
        invoker: F,
        validate: V,
    ) -> GatewayResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
        V: Fn(&T) -> bool,
    {
        self.run(category, None, invoker, validate, |_: &str| true)
            .await
    }

    /// Like [`execute`](Self::execute), giving up once `deadline` passes.
    pub async fn execute_with_deadline<T, F, Fut>(
        &self,
        category: &str,
        deadline: Instant,
        invoker: F,
    ) -> GatewayResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        self.run(category, Some(deadline), invoker, |_: &T| true, |_: &str| true)
            .await
    }

    /// Serve `category` from registered adapters.
    ///
    /// Candidates without an adapter are skipped like open breakers.
    pub async fn execute_sources<Req: Sync, Resp: Send>(
        &self,
        category: &str,
        sources: &SourceSet<Req, Resp>,
        request: &Req,
    ) -> GatewayResult<Resp> {
        let invoker = |id: String| {
            let source = sources.get(&id).map(Arc::clone);
            async move {
                match source {
                    Some(s) => s.fetch(request).await,
                    None => Err(SourceError::transient(format!("no adapter for '{}'", id))),
                }
            }
        };
        self.run(category, None, invoker, |_: &Resp| true, |id: &str| {
            sources.contains(id)
        })
        .await
    }

    async fn run<T, F, Fut, V, R>(
        &self,
        category: &str,
        deadline: Option<Instant>,
        mut invoker: F,
        validate: V,
        registered: R,
    ) -> GatewayResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
        V: Fn(&T) -> bool,
        R: Fn(&str) -> bool,
    {
        let span = tracing::debug_span!("execute", category = %category, execution = %Uuid::new_v4());

        async move {
            let candidates = self.router.candidates(category).map_err(|e| {
                tracing::error!(error = %e, "Category cannot be routed");
                GatewayError::from(e)
            })?;
            tracing::debug!(
                order = ?candidates.iter().map(|c| c.source.as_str()).collect::<Vec<_>>(),
                "Candidates ranked"
            );

            let mut failures: Vec<SourceFailure> = Vec::new();

            for candidate in candidates {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::warn!(attempted = failures.len(), "Overall deadline reached, aborting");
                    return Err(GatewayError::DeadlineExceeded {
                        category: category.to_string(),
                        failures,
                    });
                }

                let source = candidate.source;

                if !registered(&source) {
                    tracing::debug!(source = %source, "No adapter registered, skipping");
                    failures.push(SourceFailure::new(source, FailureReason::NotRegistered));
                    continue;
                }

                let Some(permit) = self.breakers.get(&source).try_acquire() else {
                    tracing::debug!(source = %source, "Circuit open, skipping");
                    metrics::record_breaker_skip(&source);
                    failures.push(SourceFailure::new(source, FailureReason::CircuitOpen));
                    continue;
                };

                let started = Instant::now();
                let bounded = call_with_deadline(invoker(source.clone()), candidate.timeout, deadline).await;
                let latency = started.elapsed();

                let outcome = match bounded {
                    Bounded::Completed(Ok(payload)) => {
                        if validate(&payload) {
                            let outcome = RequestOutcome::success(&source, category, latency);
                            outcome.apply(permit, &self.health);
                            if !failures.is_empty() {
                                metrics::record_fallback(category);
                            }
                            tracing::info!(
                                source = %source,
                                latency_ms = latency.as_millis() as u64,
                                skipped_or_failed = failures.len(),
                                "Served"
                            );
                            return Ok(payload);
                        }
                        RequestOutcome::failure(
                            &source,
                            category,
                            latency,
                            SourceError::invalid_payload("payload rejected by validation"),
                        )
                    }
                    Bounded::Completed(Err(e)) => RequestOutcome::failure(&source, category, latency, e),
                    Bounded::SourceTimedOut(after) => {
                        RequestOutcome::failure(&source, category, latency, SourceError::timeout(after))
                    }
                    Bounded::CallerDeadline => {
                        // Permit dropped unsettled: nothing recorded for this source.
                        tracing::warn!(source = %source, "Overall deadline reached mid-call, aborting");
                        return Err(GatewayError::DeadlineExceeded {
                            category: category.to_string(),
                            failures,
                        });
                    }
                };

                if let Some(err) = outcome.apply(permit, &self.health) {
                    tracing::warn!(
                        source = %source,
                        error = %err,
                        latency_ms = latency.as_millis() as u64,
                        "Source failed, falling back"
                    );
                    failures.push(SourceFailure::new(source, FailureReason::Failed(err)));
                }
            }

            metrics::record_exhausted(category);
            tracing::error!(
                reasons = %failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "),
                "All sources exhausted"
            );
            Err(GatewayError::AllSourcesExhausted {
                category: category.to_string(),
                failures,
            })
        }
        .instrument(span)
        .await
    }
}
