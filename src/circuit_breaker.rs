//! Per-source circuit breaker.
//!
//! Tracks consecutive failures per source and short-circuits calls to a
//! source that keeps failing. After a cooldown, a tripped source enters a
//! half-open state in which exactly one probe call is admitted; every
//! other caller is rejected without waiting until the probe's outcome is
//! recorded.
//!
//! # State machine
//!
//! ```text
//! ┌────────┐  F consecutive  ┌────────┐   cooldown C   ┌──────────┐
//! │ Closed ├────────────────►│  Open  ├───────────────►│ HalfOpen │
//! └───▲────┘    failures     └────────┘                └────┬─────┘
//!     │                          ▲      probe failure       │
//!     │     probe success        └──────────────────────────┤
//!     └─────────────────────────────────────────────────────┘
//! ```
//!
//! One breaker value is created per dispatcher and holds a fixed map of
//! per-source state; transitions for one source never contend with
//! another source's.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

use crate::config::BreakerPolicy;
use crate::types::SourceId;

/// Circuit state for a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Source is healthy — calls are admitted, failures counted.
    Closed,
    /// Source has failed too many times in a row — calls are rejected
    /// until the cooldown elapses.
    Open,
    /// Cooldown has elapsed — one probe call decides recovery.
    HalfOpen,
}

/// Decision returned by [`CircuitBreaker::try_acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed; proceed normally.
    Allowed,
    /// Circuit half-open; this caller holds the single probe slot and
    /// must report the outcome via `record_success`/`record_failure`.
    Probe,
    /// Circuit open (or the probe slot is taken); skip without calling.
    Rejected,
}

#[derive(Debug)]
struct SourceHealth {
    state: CircuitState,
    consecutive_failures: u32,
    /// When the circuit last entered `Open`.
    opened_at: Option<Instant>,
    /// Whether the half-open probe slot is currently held.
    probe_in_flight: bool,
}

impl SourceHealth {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Per-source failure-tracking gate.
///
/// Created once per dispatcher; state persists for the dispatcher's
/// lifetime and transitions are driven exclusively by recorded call
/// outcomes (and cooldown expiry observed at admission time).
#[derive(Debug)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    sources: HashMap<SourceId, Mutex<SourceHealth>>,
}

impl CircuitBreaker {
    /// Create a breaker tracking exactly the given sources.
    pub fn new(policy: BreakerPolicy, sources: &[SourceId]) -> Self {
        let sources = sources
            .iter()
            .map(|&s| (s, Mutex::new(SourceHealth::new())))
            .collect();
        Self { policy, sources }
    }

    /// Ask whether a call to `source` may proceed.
    ///
    /// - `Closed` → [`Admission::Allowed`]
    /// - `Open` with cooldown elapsed → transitions to `HalfOpen` and
    ///   grants [`Admission::Probe`] to this caller
    /// - `Open` otherwise, or `HalfOpen` with the probe already taken →
    ///   [`Admission::Rejected`]
    ///
    /// Sources the breaker does not track are always admitted.
    pub fn try_acquire(&self, source: SourceId) -> Admission {
        let Some(health) = self.sources.get(&source) else {
            return Admission::Allowed;
        };
        let mut health = health.lock().unwrap_or_else(PoisonError::into_inner);

        match health.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let cooled = health
                    .opened_at
                    .is_none_or(|t| t.elapsed() >= self.policy.cooldown);
                if cooled {
                    health.state = CircuitState::HalfOpen;
                    health.probe_in_flight = true;
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if health.probe_in_flight {
                    Admission::Rejected
                } else {
                    health.probe_in_flight = true;
                    Admission::Probe
                }
            }
        }
    }

    /// Record a successful call: the circuit closes and the consecutive
    /// failure counter resets, regardless of previous state.
    pub fn record_success(&self, source: SourceId) {
        let Some(health) = self.sources.get(&source) else {
            return;
        };
        let mut health = health.lock().unwrap_or_else(PoisonError::into_inner);
        health.state = CircuitState::Closed;
        health.consecutive_failures = 0;
        health.opened_at = None;
        health.probe_in_flight = false;
    }

    /// Record a failed call.
    ///
    /// In `Closed`, increments the consecutive-failure counter and trips
    /// to `Open` at the threshold. In `HalfOpen`, the probe failed: the
    /// circuit reopens and the cooldown restarts.
    pub fn record_failure(&self, source: SourceId) {
        let Some(health) = self.sources.get(&source) else {
            return;
        };
        let mut health = health.lock().unwrap_or_else(PoisonError::into_inner);
        health.consecutive_failures += 1;
        health.probe_in_flight = false;

        match health.state {
            CircuitState::Closed => {
                if health.consecutive_failures >= self.policy.failure_threshold {
                    health.state = CircuitState::Open;
                    health.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                health.state = CircuitState::Open;
                health.opened_at = Some(Instant::now());
            }
            // A straggler failure (e.g. an abandoned call reporting in
            // after the trip) keeps the circuit open without restarting
            // the cooldown.
            CircuitState::Open => {}
        }
    }

    /// Current circuit state for a source. Untracked sources read as
    /// `Closed`.
    pub fn state(&self, source: SourceId) -> CircuitState {
        self.sources
            .get(&source)
            .map_or(CircuitState::Closed, |h| {
                h.lock().unwrap_or_else(PoisonError::into_inner).state
            })
    }

    /// (source, state, consecutive failures) for every tracked source.
    pub fn health_report(&self) -> Vec<(SourceId, CircuitState, u32)> {
        let mut report: Vec<_> = self
            .sources
            .iter()
            .map(|(&source, health)| {
                let health = health.lock().unwrap_or_else(PoisonError::into_inner);
                (source, health.state, health.consecutive_failures)
            })
            .collect();
        report.sort_by_key(|(source, _, _)| *source);
        report
    }
}
