//! Circuit breaker for source protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: source assumed down, calls are skipped
//! - Half-Open: a bounded number of trials test whether the source recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: first can_execute() after the open timeout
//! Half-Open → Closed: consecutive_successes >= success_threshold
//! Half-Open → Open: any failure
//! ```
//!
//! # Design Decisions
//! - One breaker per source, one mutex per breaker
//! - `can_execute` and the Open → Half-Open transition share one critical
//!   section, so concurrent callers cannot overrun the trial budget
//! - A finished half-open trial releases its slot; the budget bounds trials
//!   in flight, not trials ever issued

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    /// How long the circuit stays open before a trial is allowed.
    pub timeout: Duration,
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

impl From<&BreakerConfig> for CircuitBreakerConfig {
    fn from(cfg: &BreakerConfig) -> Self {
        Self {
            failure_threshold: cfg.failure_threshold,
            success_threshold: cfg.success_threshold,
            timeout: Duration::from_secs(cfg.timeout_secs),
            half_open_max_calls: cfg.half_open_max_calls,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_half_open_max_calls(mut self, calls: u32) -> Self {
        self.half_open_max_calls = calls;
        self
    }
}

/// Point-in-time view of a breaker, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStatus {
    pub source: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub half_open_trials_issued: u32,
    pub ms_since_state_change: u64,
    /// Remaining open time in ms, if currently open.
    pub open_remaining_ms: Option<u64>,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout_ms: u64,
    pub half_open_max_calls: u32,
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_state_change: Instant,
    half_open_trials_issued: u32,
    /// Trials granted through `can_execute`, which carry no permit.
    untracked_trials: u32,
    /// Bumped on every transition; ties a permit to the period that issued it.
    generation: u64,
}

impl State {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_state_change: Instant::now(),
            half_open_trials_issued: 0,
            untracked_trials: 0,
            generation: 0,
        }
    }
}

/// Per-source circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    source: String,
    cfg: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(source: impl Into<String>, cfg: CircuitBreakerConfig) -> Self {
        Self {
            source: source.into(),
            cfg,
            state: Mutex::new(State::closed()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.cfg
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Counters stay consistent under poisoning: every mutation is a plain store.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call to this source is currently permitted.
    ///
    /// In half-open, a `true` answer consumes one trial slot.
    pub fn can_execute(&self) -> bool {
        let mut st = self.lock();
        let admitted = self.admit(&mut st);
        if admitted && st.state == CircuitState::HalfOpen {
            st.untracked_trials += 1;
        }
        admitted
    }

    /// Like [`can_execute`](Self::can_execute), but returns a permit that
    /// hands an unused half-open trial slot back if it is dropped unsettled.
    pub fn try_acquire(self: &Arc<Self>) -> Option<CallPermit> {
        let mut st = self.lock();
        if !self.admit(&mut st) {
            return None;
        }
        Some(CallPermit {
            breaker: Arc::clone(self),
            generation: st.generation,
            settled: false,
        })
    }

    fn admit(&self, st: &mut State) -> bool {
        if st.state == CircuitState::Open {
            if st.last_state_change.elapsed() < self.cfg.timeout {
                return false;
            }
            self.transition(st, CircuitState::HalfOpen);
        }

        match st.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if st.half_open_trials_issued < self.cfg.half_open_max_calls {
                    st.half_open_trials_issued += 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::Open => false,
        }
    }

    /// Record a successful call made after [`can_execute`](Self::can_execute).
    pub fn record_success(&self) {
        let mut st = self.lock();
        let held_trial = st.untracked_trials > 0;
        if held_trial {
            st.untracked_trials -= 1;
        }
        self.on_success(&mut st, held_trial);
    }

    /// Success of a permit; only a trial of the current half-open period
    /// frees a slot.
    fn settle_success(&self, generation: u64) {
        let mut st = self.lock();
        let held_trial = st.state == CircuitState::HalfOpen && st.generation == generation;
        self.on_success(&mut st, held_trial);
    }

    fn on_success(&self, st: &mut State, held_trial: bool) {
        match st.state {
            CircuitState::Closed => {
                st.consecutive_failures = 0;
                st.consecutive_successes = st.consecutive_successes.saturating_add(1);
            }
            CircuitState::HalfOpen => {
                st.consecutive_failures = 0;
                st.consecutive_successes = st.consecutive_successes.saturating_add(1);
                if held_trial {
                    st.half_open_trials_issued = st.half_open_trials_issued.saturating_sub(1);
                }
                if st.consecutive_successes >= self.cfg.success_threshold {
                    self.transition(st, CircuitState::Closed);
                }
            }
            // A call admitted before the circuit opened; the open timer stands.
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut st = self.lock();
        st.consecutive_successes = 0;
        st.consecutive_failures = st.consecutive_failures.saturating_add(1);
        match st.state {
            CircuitState::Closed => {
                if st.consecutive_failures >= self.cfg.failure_threshold {
                    self.transition(&mut st, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => self.transition(&mut st, CircuitState::Open),
            CircuitState::Open => {}
        }
    }

    /// Return to Closed with all counters cleared.
    pub fn reset(&self) {
        let mut st = self.lock();
        self.transition(&mut st, CircuitState::Closed);
        tracing::info!(source = %self.source, "Circuit breaker reset");
    }

    /// Open the circuit now, regardless of counters.
    pub fn force_open(&self) {
        let mut st = self.lock();
        self.transition(&mut st, CircuitState::Open);
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn status(&self) -> CircuitBreakerStatus {
        let st = self.lock();
        let elapsed = st.last_state_change.elapsed();
        let open_remaining_ms = match st.state {
            CircuitState::Open => Some(self.cfg.timeout.saturating_sub(elapsed).as_millis() as u64),
            _ => None,
        };
        CircuitBreakerStatus {
            source: self.source.clone(),
            state: st.state,
            consecutive_failures: st.consecutive_failures,
            consecutive_successes: st.consecutive_successes,
            half_open_trials_issued: st.half_open_trials_issued,
            ms_since_state_change: elapsed.as_millis() as u64,
            open_remaining_ms,
            failure_threshold: self.cfg.failure_threshold,
            success_threshold: self.cfg.success_threshold,
            timeout_ms: self.cfg.timeout.as_millis() as u64,
            half_open_max_calls: self.cfg.half_open_max_calls,
        }
    }

    fn release(&self, generation: u64) {
        let mut st = self.lock();
        if st.state == CircuitState::HalfOpen && st.generation == generation {
            st.half_open_trials_issued = st.half_open_trials_issued.saturating_sub(1);
        }
    }

    fn transition(&self, st: &mut State, to: CircuitState) {
        let from = st.state;
        st.state = to;
        st.last_state_change = Instant::now();
        st.half_open_trials_issued = 0;
        st.untracked_trials = 0;
        st.generation = st.generation.wrapping_add(1);
        match to {
            CircuitState::Closed => {
                st.consecutive_failures = 0;
                st.consecutive_successes = 0;
            }
            CircuitState::HalfOpen => st.consecutive_successes = 0,
            CircuitState::Open => st.consecutive_successes = 0,
        }

        if from != to {
            match to {
                CircuitState::Open => tracing::warn!(
                    source = %self.source,
                    from = %from,
                    failures = st.consecutive_failures,
                    cooldown_ms = self.cfg.timeout.as_millis() as u64,
                    "Circuit opened"
                ),
                _ => tracing::info!(source = %self.source, from = %from, to = %to, "Circuit state changed"),
            }
        }
        metrics::record_breaker_state(&self.source, to);
    }
}

/// Permission to make one call, settled by recording its outcome.
///
/// Dropping an unsettled permit (cancelled call, caller deadline) records
/// nothing and returns the half-open trial slot it may hold.
#[derive(Debug)]
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    settled: bool,
}

impl CallPermit {
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.settle_success(self.generation);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}
