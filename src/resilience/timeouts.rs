//! Per-call deadline enforcement.
//!
//! Uses Tokio's timer; the gateway never runs its own timer thread. A timed
//! out call is a transient source failure, and dropping the future is the
//! adapter's cancellation signal.

use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout, Instant};

use crate::error::SourceError;

/// How a deadline-bounded call ended.
#[derive(Debug)]
pub enum Bounded<T> {
    /// The call finished (successfully or not) within its deadline.
    Completed(Result<T, SourceError>),
    /// The source's own timeout elapsed first.
    SourceTimedOut(Duration),
    /// The caller's overall deadline elapsed first.
    CallerDeadline,
}

/// Run `fut` under the source timeout, further capped by the caller's deadline.
pub async fn call_with_deadline<T, F>(
    fut: F,
    source_timeout: Duration,
    overall: Option<Instant>,
) -> Bounded<T>
where
    F: Future<Output = Result<T, SourceError>>,
{
    let remaining = overall.map(|d| d.saturating_duration_since(Instant::now()));
    let (limit, caller_bound) = match remaining {
        Some(r) if r < source_timeout => (r, true),
        _ => (source_timeout, false),
    };

    match timeout(limit, fut).await {
        Ok(result) => Bounded::Completed(result),
        Err(_) if caller_bound => Bounded::CallerDeadline,
        Err(_) => Bounded::SourceTimedOut(source_timeout),
    }
}
