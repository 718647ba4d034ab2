//! Bounded exponential backoff for throttled upstream calls.

use crate::RetryConfig;
use std::future::Future;
use std::time::Duration;
use tessera_error::RetryableError;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Retry schedule for one upstream invocation.
///
/// Only errors reporting [`RetryableError::is_retryable`] are retried; all
/// others propagate after the first attempt. The delay before retry `n`
/// (zero-based) is `base_delay * 2^n`, so the defaults wait 1s, 2s and 4s.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tessera_routing::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(1));
/// let delays: Vec<Duration> = policy.delays().collect();
/// assert_eq!(delays, vec![
///     Duration::from_secs(1),
///     Duration::from_secs(2),
///     Duration::from_secs(4),
/// ]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with `max_retries` attempts beyond the first.
    pub fn new(max_retries: usize, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Create a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.base_delay_ms))
    }

    /// A policy that attempts exactly once.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Additional attempts beyond the first.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delays between consecutive attempts.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.base_delay;
        (0..self.max_retries).map(move |n| {
            let factor = 1u32.checked_shl(n as u32).unwrap_or(u32::MAX);
            base.saturating_mul(factor)
        })
    }

    /// Sum of all delays when every retry is used.
    pub fn total_backoff(&self) -> Duration {
        self.delays().fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run an operation under this policy.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable error once
    /// the schedule is exhausted.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + std::fmt::Display,
    {
        let mut attempt = 0usize;
        let max_retries = self.max_retries;

        Retry::spawn(self.delays(), || {
            attempt += 1;
            let current = attempt;
            let fut = operation();
            async move {
                match fut.await {
                    Ok(value) => {
                        if current > 1 {
                            debug!(attempt = current, "Upstream call succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(e) if e.is_retryable() && current <= max_retries => {
                        warn!(attempt = current, error = %e, "Throttled, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        debug!(attempt = current, error = %e, "Not retrying");
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        })
        .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
