//! Retry with exponential backoff for rate-limited store calls.
//!
//! The backing store throttles bursts of writes; this wrapper retries a
//! single fallible operation with pure exponential backoff (1s, 2s, 4s
//! for the default policy) when the caller-supplied predicate says the
//! failure is transient. Everything else propagates unchanged.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff configuration for [`retry_with_backoff`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following attempt `attempt` (0-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op`, retrying while `is_transient` classifies the failure as
/// retryable and attempts remain.
///
/// The predicate keeps transport error shapes out of this module:
/// callers pass something like `StoreError::is_rate_limit`.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || attempt + 1 >= policy.max_retries.max(1) {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    delay_ms = delay.as_millis() as u64,
                    attempt = attempt + 1,
                    error = %err,
                    "rate limited, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
