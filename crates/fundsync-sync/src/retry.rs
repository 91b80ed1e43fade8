//! Bounded exponential backoff for rate-limited directory calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DirectoryError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 32_000,
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (1-based): the base doubled per
    /// attempt, or the server's `Retry-After`, capped at the maximum.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.max_backoff_ms);
        if let Some(hint) = retry_after {
            return hint.min(cap);
        }
        let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(exponent)
                .min(self.max_backoff_ms),
        )
    }

    /// Runs `call`, retrying while it reports rate limiting.
    ///
    /// Other errors return immediately. When attempts run out the last
    /// `RateLimited` error is returned.
    pub fn run<T>(
        &self,
        operation: &str,
        mut call: impl FnMut() -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call() {
                Err(DirectoryError::RateLimited { retry_after }) if attempt < attempts => {
                    let delay = self.delay(attempt, retry_after);
                    warn!(operation, attempt, attempts, ?delay, "rate limited, backing off");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 6,
            initial_backoff_ms: 100,
            max_backoff_ms: 500,
        };
        let delays: Vec<u64> = (1..=5)
            .map(|n| policy.delay(n, None).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
        assert_eq!(
            policy.delay(1, Some(Duration::from_secs(60))),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn retries_rate_limits_until_success() {
        let mut calls = 0;
        let result = RetryPolicy::immediate(3).run("modify", || {
            calls += 1;
            if calls < 3 {
                Err(DirectoryError::RateLimited { retry_after: None })
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(3));
    }

    #[test]
    fn exhaustion_returns_rate_limited() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(2).run("modify", || {
            calls += 1;
            Err(DirectoryError::RateLimited { retry_after: None })
        });
        assert_eq!(calls, 2);
        assert!(result.unwrap_err().is_rate_limited());
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::immediate(5).run("create", || {
            calls += 1;
            Err(DirectoryError::Upstream {
                status: 500,
                message: "boom".into(),
            })
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(DirectoryError::Upstream { status: 500, .. })));
    }
}
