//! Bounded exponential backoff for upstream calls
//!
//! Both upstream clients run each request through [`RetryPolicy::execute_with_retry`].
//! The caller decides which failures are worth another attempt; anything else
//! is handed back immediately.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of attempts, including the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound for a single backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Errors surfaced by [`RetryPolicy::execute_with_retry`]
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("All {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt failed with an error that must not be retried
    #[error("Non-retryable error: {0}")]
    Permanent(E),
}

impl<E> RetryError<E> {
    /// Returns the error from the final attempt
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Permanent(err) => err,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

/// Retry configuration shared by the upstream clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "millis")]
    pub initial_delay: Duration,
    /// Growth factor applied to each subsequent delay
    pub multiplier: f64,
    /// Upper bound for a single delay
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A policy with the default attempt count and a custom starting delay
    pub fn with_initial_delay(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Delay to wait before retry number `retry` (1-based)
    ///
    /// Grows by `multiplier` per retry and never exceeds `max_delay`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let factor = self.multiplier.max(1.0).powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// `is_retryable` classifies each failure. A non-retryable failure is returned
    /// as [`RetryError::Permanent`] without further attempts; once `max_attempts`
    /// is reached the last failure is returned as [`RetryError::Exhausted`].
    pub async fn execute_with_retry<T, E, F, Fut, P>(
        &self,
        mut operation: F,
        is_retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "upstream call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !is_retryable(&err) => {
                    debug!(attempt, error = %err, "upstream call failed with non-retryable error");
                    return Err(RetryError::Permanent(err));
                }
                Err(err) if attempt >= attempts => {
                    warn!(attempts, error = %err, "upstream call failed, retries exhausted");
                    return Err(RetryError::Exhausted {
                        attempts,
                        last: err,
                    });
                }
                Err(err) => {
                    let delay = self.delay_for_retry(attempt);
                    warn!(
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "upstream call failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Serde helper for durations written as integer milliseconds
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
