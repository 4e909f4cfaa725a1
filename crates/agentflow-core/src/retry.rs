//! Retry with exponential backoff (spec §4.1).
//!
//! Grounded on the teacher's resilience style (config-struct + free function,
//! see `skilllite-agent/agent_loop/execution.rs`'s retry-with-backoff loop for
//! tool calls) generalized into a reusable primitive for any fallible async
//! operation.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::AgentError;

/// Retry configuration (spec §4.1).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before attempt `n` (1-indexed), per spec §4.1:
    /// `min(base_delay * exponential_base^(n-1), max_delay)`, with optional full jitter.
    pub fn delay_for_attempt(&self, n: usize) -> Duration {
        let exp = self.exponential_base.powi((n.saturating_sub(1)) as i32);
        let raw_ms = (self.base_delay.as_millis() as f64 * exp).min(self.max_delay.as_millis() as f64);
        let ms = if self.jitter && raw_ms > 0.0 {
            rand::thread_rng().gen_range(0.0..=raw_ms)
        } else {
            raw_ms
        };
        Duration::from_millis(ms as u64)
    }
}

/// Retry `op` under `config`, stopping as soon as the predicate says an error
/// is not retryable, or attempts are exhausted. Retry sleeps are ordinary
/// `tokio::time::sleep` calls and are therefore cancellation points, per
/// spec §5 ("every sleep in retry/backoff ... is a cancellation point").
pub async fn retry<T, E, Op, Fut, Pred>(
    config: &RetryConfig,
    mut op: Op,
    retryable_predicate: Pred,
) -> Result<T, E>
where
    Op: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Pred: Fn(&E) -> bool,
{
    let mut attempt = 1usize;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= config.max_attempts || !retryable_predicate(&e) {
                    return Err(e);
                }
                let delay = config.delay_for_attempt(attempt);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Default retryable predicate for [`AgentError`]: transient I/O, timeout,
/// HTTP 429/503, or an explicit `Retryable` variant (spec §4.1).
pub fn default_retryable_predicate(e: &AgentError) -> bool {
    e.is_retryable()
}
