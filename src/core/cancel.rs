//! Cancellation and deadlines for remote operations
//!
//! Remote operations suspend in exactly two places: network I/O and sleeps
//! (backoff waits, poll intervals). A [`CancelToken`] is consulted at both.
//! It combines the process shutdown signal (a `tokio::sync::watch` channel
//! flipped to `true` on SIGINT/SIGTERM) with an optional deadline.

use crate::domain::{RegistrarError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Shutdown signal plus optional deadline
///
/// Cheap to clone; clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that never fires
    pub fn none() -> Self {
        Self::default()
    }

    /// A token that fires once the watch value becomes `true`
    pub fn from_signal(signal: watch::Receiver<bool>) -> Self {
        Self {
            signal: Some(signal),
            deadline: None,
        }
    }

    /// A copy of this token that additionally expires `timeout` from now
    ///
    /// An existing earlier deadline is kept.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self {
            signal: self.signal.clone(),
            deadline: Some(deadline),
        }
    }

    /// Deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the shutdown signal has been raised
    pub fn is_cancelled(&self) -> bool {
        self.signal.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Fail fast if the token already fired
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(RegistrarError::Cancelled(operation.to_string()));
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RegistrarError::DeadlineExceeded(operation.to_string()));
            }
        }
        Ok(())
    }

    /// Run `fut` unless the token fires first
    pub async fn guard<F: Future>(&self, operation: &str, fut: F) -> Result<F::Output> {
        self.check(operation)?;
        tokio::select! {
            output = fut => Ok(output),
            err = self.fired(operation) => Err(err),
        }
    }

    /// Sleep for `duration` unless the token fires first
    pub async fn sleep(&self, operation: &str, duration: Duration) -> Result<()> {
        self.guard(operation, tokio::time::sleep(duration)).await
    }

    async fn fired(&self, operation: &str) -> RegistrarError {
        let cancelled = async {
            if let Some(rx) = &self.signal {
                let mut rx = rx.clone();
                let raised = rx.wait_for(|shutdown| *shutdown).await.is_ok();
                if raised {
                    return;
                }
            }
            // No signal, or the sender is gone: this arm never completes.
            std::future::pending::<()>().await
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancelled => RegistrarError::Cancelled(operation.to_string()),
            _ = expired => RegistrarError::DeadlineExceeded(operation.to_string()),
        }
    }
}
