// ABOUTME: Bounded retry with exponential backoff and full jitter for upstream calls
// ABOUTME: Only transient upstream failures are retried; everything else propagates at once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{error, warn};

use crate::config::ChatConfig;
use crate::errors::AppResult;

/// Retry schedule for a single logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff ceiling for the first retry
    pub base_delay: Duration,
    /// Upper bound for any single backoff
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Never retry
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Build from chat settings
    #[must_use]
    pub const fn from_chat_config(config: &ChatConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Exponential ceiling for retry number `retry` (0-based), capped at `max_delay`
    #[must_use]
    pub fn delay_ceiling(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Full jitter: uniform in `[0, ceiling]`
    #[must_use]
    pub fn jittered_delay(&self, retry: u32) -> Duration {
        let ceiling = u64::try_from(self.delay_ceiling(retry).as_millis()).unwrap_or(u64::MAX);
        if ceiling == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
    }

    /// Run `operation`, retrying transient failures
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error, or the last error once retries
    /// are exhausted
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut retry = 0;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.code.is_transient() && retry < self.max_retries => {
                    let delay = self.jittered_delay(retry);
                    retry += 1;
                    warn!(
                        operation,
                        attempt = retry,
                        max_retries = self.max_retries,
                        backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Transient upstream failure, retrying after backoff"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if e.code.is_transient() {
                        error!(operation, attempts = retry + 1, error = %e, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_chat_config(&ChatConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AppError, ErrorCode};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_delay_ceiling_doubles_then_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_millis(4000),
        };
        assert_eq!(policy.delay_ceiling(0), Duration::from_millis(250));
        assert_eq!(policy.delay_ceiling(1), Duration::from_millis(500));
        assert_eq!(policy.delay_ceiling(4), Duration::from_millis(4000));
        assert_eq!(policy.delay_ceiling(40), Duration::from_millis(4000));
    }

    #[test]
    fn test_jitter_stays_within_ceiling() {
        let policy = RetryPolicy::default();
        for retry in 0..6 {
            assert!(policy.jittered_delay(retry) <= policy.delay_ceiling(retry));
        }
        assert_eq!(RetryPolicy::none().jittered_delay(3), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(2)
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::external_rate_limited("model", "slow down"))
                } else {
                    Ok("done")
                }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = fast_policy(1)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::external_unavailable("model", "overloaded"))
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::ExternalServiceUnavailable);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = fast_policy(3)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::external_auth("model", "bad key"))
            })
            .await;
        assert_eq!(result.unwrap_err().code, ErrorCode::ExternalAuthFailed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
