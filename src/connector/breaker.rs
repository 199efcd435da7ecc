//! Three-state circuit breaker
//!
//! The breaker never reads the clock itself: every time-dependent method has
//! an `_at` form taking the current [`Instant`], and the plain form passes
//! `Instant::now()`.
//!
//! - `Closed -> Open` when `failure_count` reaches `failure_threshold`
//! - `Open -> HalfOpen` once `reset_timeout` has elapsed since the last
//!   failure
//! - `HalfOpen -> Closed` only on [`CircuitBreaker::record_success`]
//! - any failure while `Closed` or `HalfOpen` counts, and may re-open

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConnectorConfig;
use std::time::{Duration, Instant};

/// Default failures before the circuit opens.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default wait before an open circuit allows a probe.
pub const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Failing fast
    Open,
    /// Waiting for a probe to confirm recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        })
    }
}

/// Circuit breaker implementation
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT)
    }
}

impl CircuitBreaker {
    /// A closed breaker.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure: None,
            failure_threshold,
            reset_timeout,
        }
    }

    /// A closed breaker with the configured threshold and timeout.
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(
            config.failure_threshold,
            Duration::from_secs(config.reset_timeout_seconds),
        )
    }

    /// State at `now`. An open circuit turns half-open once strictly more
    /// than `reset_timeout` has passed since the last failure.
    pub fn state_at(&mut self, now: Instant) -> CircuitState {
        if self.state == CircuitState::Open {
            let waited = self
                .last_failure
                .map(|at| now.saturating_duration_since(at))
                .unwrap_or(Duration::MAX);
            if waited > self.reset_timeout {
                self.state = CircuitState::HalfOpen;
            }
        }
        self.state
    }

    /// [`CircuitBreaker::state_at`] against the clock.
    pub fn state(&mut self) -> CircuitState {
        self.state_at(Instant::now())
    }

    /// Count a failure at `now`. Returns `true` if this failure opened the
    /// circuit.
    pub fn record_failure_at(&mut self, now: Instant) -> bool {
        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(now);

        if self.failure_count >= self.failure_threshold && self.state != CircuitState::Open {
            self.state = CircuitState::Open;
            return true;
        }
        false
    }

    /// [`CircuitBreaker::record_failure_at`] against the clock.
    pub fn record_failure(&mut self) -> bool {
        self.record_failure_at(Instant::now())
    }

    /// A successful probe. Closes a half-open circuit and clears the count;
    /// returns `true` if it did.
    pub fn record_success(&mut self) -> bool {
        if self.state == CircuitState::HalfOpen {
            self.reset();
            return true;
        }
        false
    }

    /// Back to closed with no failures recorded.
    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.failure_count = 0;
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }
}
