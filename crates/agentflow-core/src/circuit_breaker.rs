//! Circuit breaker, keyed by dependency name (spec §4.1).
//!
//! The registry is an explicit, injectable object (not a module-level
//! global), per the "Registry + global singletons → explicit process
//! context" design note — callers own an `Arc<CircuitBreakerRegistry>` and
//! pass it around rather than reaching for a `static`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Circuit breaker state machine states (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Per-dependency breaker configuration.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_max_calls: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 1,
        }
    }
}

/// Mutable breaker state for one dependency key.
#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    opened_at: Option<Instant>,
    half_open_inflight: u32,
    half_open_successes: u32,
    config: BreakerConfig,
}

impl BreakerInner {
    fn new(config: BreakerConfig) -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            opened_at: None,
            half_open_inflight: 0,
            half_open_successes: 0,
            config,
        }
    }

    fn maybe_transition_from_open(&mut self) {
        if self.state == BreakerState::Open {
            if let Some(opened_at) = self.opened_at {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    self.state = BreakerState::HalfOpen;
                    self.half_open_inflight = 0;
                    self.half_open_successes = 0;
                }
            }
        }
    }
}

/// A single dependency's circuit breaker. Cheap to clone (wraps an `Arc`).
#[derive(Clone)]
pub struct CircuitBreaker {
    key: String,
    inner: Arc<Mutex<BreakerInner>>,
}

/// Outcome of [`CircuitBreaker::admit`].
pub enum Admission {
    /// Call may proceed; report the outcome via [`CircuitBreaker::record_success`]
    /// or [`CircuitBreaker::record_failure`].
    Allowed,
    /// Call must fail fast; the breaker is open.
    Rejected,
}

impl CircuitBreaker {
    fn new(key: String, config: BreakerConfig) -> Self {
        Self { key, inner: Arc::new(Mutex::new(BreakerInner::new(config))) }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn state(&self) -> BreakerState {
        let mut inner = self.inner.lock().await;
        inner.maybe_transition_from_open();
        inner.state
    }

    /// Decide whether a call may proceed, per the closed/open/half_open rules
    /// in spec §4.1. In `half_open`, admits at most `half_open_max_calls`
    /// concurrently (spec's "breaker fairness" law).
    pub async fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().await;
        inner.maybe_transition_from_open();
        match inner.state {
            BreakerState::Closed => Admission::Allowed,
            BreakerState::Open => Admission::Rejected,
            BreakerState::HalfOpen => {
                if inner.half_open_inflight < inner.config.half_open_max_calls {
                    inner.half_open_inflight += 1;
                    Admission::Allowed
                } else {
                    Admission::Rejected
                }
            }
        }
    }

    pub async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count = 0;
            }
            BreakerState::HalfOpen => {
                inner.half_open_successes += 1;
                inner.half_open_inflight = inner.half_open_inflight.saturating_sub(1);
                if inner.half_open_successes >= inner.config.half_open_max_calls {
                    inner.state = BreakerState::Closed;
                    inner.failure_count = 0;
                    inner.opened_at = None;
                }
            }
            BreakerState::Open => {}
        }
    }

    pub async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= inner.config.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen => {
                inner.half_open_inflight = inner.half_open_inflight.saturating_sub(1);
                inner.state = BreakerState::Open;
                inner.opened_at = Some(Instant::now());
                inner.failure_count = inner.config.failure_threshold;
            }
            BreakerState::Open => {}
        }
    }
}

/// Process-wide registry of circuit breakers, one per dependency key.
#[derive(Clone, Default)]
pub struct CircuitBreakerRegistry {
    breakers: Arc<Mutex<HashMap<String, CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the breaker for `key`, creating one with `config` if absent.
    pub async fn get_or_create(&self, key: &str, config: BreakerConfig) -> CircuitBreaker {
        let mut guard = self.breakers.lock().await;
        guard
            .entry(key.to_string())
            .or_insert_with(|| CircuitBreaker::new(key.to_string(), config))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_failures() {
        let registry = CircuitBreakerRegistry::new();
        let cfg = BreakerConfig { failure_threshold: 3, ..Default::default() };
        let breaker = registry.get_or_create("llm", cfg).await;
        for _ in 0..3 {
            assert!(matches!(breaker.admit().await, Admission::Allowed));
            breaker.record_failure().await;
        }
        assert_eq!(breaker.state().await, BreakerState::Open);
        assert!(matches!(breaker.admit().await, Admission::Rejected));
    }

    #[tokio::test]
    async fn half_open_admits_exactly_configured_probes() {
        let registry = CircuitBreakerRegistry::new();
        let cfg = BreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(0),
            half_open_max_calls: 1,
        };
        let breaker = registry.get_or_create("db", cfg).await;
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, BreakerState::HalfOpen);
        assert!(matches!(breaker.admit().await, Admission::Allowed));
        // second concurrent probe must fail fast
        assert!(matches!(breaker.admit().await, Admission::Rejected));
    }

    #[tokio::test]
    async fn half_open_success_closes_breaker() {
        let registry = CircuitBreakerRegistry::new();
        let cfg = BreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(0),
            half_open_max_calls: 1,
        };
        let breaker = registry.get_or_create("db", cfg).await;
        breaker.record_failure().await;
        assert!(matches!(breaker.admit().await, Admission::Allowed));
        breaker.record_success().await;
        assert_eq!(breaker.state().await, BreakerState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let registry = CircuitBreakerRegistry::new();
        let cfg = BreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_millis(0),
            half_open_max_calls: 1,
        };
        let breaker = registry.get_or_create("db", cfg).await;
        breaker.record_failure().await;
        assert!(matches!(breaker.admit().await, Admission::Allowed));
        breaker.record_failure().await;
        assert_eq!(breaker.state().await, BreakerState::Open);
    }
}
