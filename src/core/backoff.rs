//! Backoff for rate-limited registry calls
//!
//! When the registry answers 429 the same call is retried after `b * k`
//! seconds, where `k` is the base delay and `b` starts at 1 and doubles after
//! every wait. Any other outcome is returned as-is. The default policy keeps
//! retrying for as long as the server throttles; `max_retries` bounds it.
//!
//! The multiplier lives on the stack of a single [`BackoffPolicy::run`] call,
//! so concurrent operations never share backoff state.

use crate::config::RetryConfig;
use crate::core::cancel::CancelToken;
use crate::domain::{RegistrarError, RemoteError, Result};
use std::future::Future;
use std::time::Duration;

/// What to do with a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffDecision {
    /// Wait this long, then issue the same call again
    RetryAfter(Duration),
    /// Not a rate limit: hand the error to the caller
    Propagate,
    /// Still rate limited and out of retries
    GiveUp,
}

/// Retry policy for 429 responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_delay: Duration,
    max_retries: Option<usize>,
}

impl BackoffPolicy {
    /// Create a policy with base delay `k` and an optional retry cap
    pub fn new(base_delay: Duration, max_retries: Option<usize>) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    /// Build the policy from the `[registry.retry]` section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.base_delay(), config.max_retries)
    }

    /// Base delay `k`
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Wait before retry number `retries_so_far + 1`: `k * 2^retries_so_far`
    pub fn delay_for(&self, retries_so_far: usize) -> Duration {
        let multiplier = u32::try_from(retries_so_far)
            .ok()
            .and_then(|shift| 1u32.checked_shl(shift))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }

    /// Decide how to handle `error` after `retries_so_far` retries
    pub fn decide(&self, error: &RegistrarError, retries_so_far: usize) -> BackoffDecision {
        if !error.is_rate_limited() {
            return BackoffDecision::Propagate;
        }
        match self.max_retries {
            Some(max) if retries_so_far >= max => BackoffDecision::GiveUp,
            _ => BackoffDecision::RetryAfter(self.delay_for(retries_so_far)),
        }
    }

    /// Run `op`, retrying it while the registry answers 429
    ///
    /// `RateLimited` never escapes this function: the caller sees either the
    /// first non-rate-limited outcome or `RetriesExhausted`. The wait and the
    /// call itself are both interrupted by `cancel`.
    pub async fn run<T, F, Fut>(&self, cancel: &CancelToken, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0usize;

        loop {
            let outcome = cancel.guard(operation, op()).await?;

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.decide(&err, retries) {
                BackoffDecision::Propagate => return Err(err),
                BackoffDecision::GiveUp => {
                    tracing::error!(
                        operation,
                        attempts = retries + 1,
                        "Rate limit persisted past the retry cap"
                    );
                    return Err(RemoteError::RetriesExhausted {
                        attempts: retries + 1,
                    }
                    .into());
                }
                BackoffDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        operation,
                        retry = retries + 1,
                        delay_secs = delay.as_secs_f64(),
                        error = %err,
                        "Rate limited, backing off"
                    );
                    cancel.sleep(operation, delay).await?;
                    retries += 1;
                }
            }
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
