//! Bounded retry for transient storage failures
//!
//! Failures in the taxonomy split into two classes: logic/state errors the
//! caller must act on, and transient faults (storage, network) worth a
//! bounded automatic retry. Domain error types opt their transient variants
//! in through [`Transient`]; everything else passes through on the first
//! attempt. Mutations stay safe to retry because stores apply each attempt
//! as one atomic critical section.

use std::future::Future;
use std::time::Duration;

/// Classifies which variants of a domain error are worth retrying
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Retry policy for transient failures: bounded attempts, doubling backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic retries after the first attempt
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each subsequent one
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_backoff: Duration::ZERO,
        }
    }

    /// Run `op`, retrying transient failures up to `max_retries` times.
    ///
    /// Non-transient errors surface immediately; after the final attempt
    /// the last error surfaces unchanged.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let backoff = self.base_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    tracing::warn!(
                        error = %err,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
