//! Jittered exponential backoff shared by outbound HTTP calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::metrics;

/// Retry policy: attempt budget, backoff schedule, jitter and which statuses retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    jitter_min: Duration,
    jitter_max: Duration,
    retryable_status: fn(StatusCode) -> bool,
}

/// Every non-success status is worth another attempt.
pub fn any_status(_: StatusCode) -> bool {
    true
}

/// Only throttling and server-side failures are worth another attempt.
pub fn throttled_or_server_error(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration, jitter_min: Duration, jitter_max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            jitter_min: jitter_min.min(jitter_max),
            jitter_max,
            retryable_status: any_status,
        }
    }

    /// Replace the status predicate.
    pub fn with_retryable_status(mut self, predicate: fn(StatusCode) -> bool) -> Self {
        self.retryable_status = predicate;
        self
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff to wait after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Random pre-request delay in `[jitter_min, jitter_max]`.
    pub fn jitter(&self) -> Duration {
        if self.jitter_max.is_zero() {
            return Duration::ZERO;
        }
        let min = self.jitter_min.as_micros() as u64;
        let max = self.jitter_max.as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(min..=max))
    }

    /// Whether a failed attempt may be retried.
    pub fn is_retryable(&self, error: &FetchError) -> bool {
        match error {
            FetchError::Status(code) => StatusCode::from_u16(*code)
                .map(self.retryable_status)
                .unwrap_or(true),
            FetchError::RateLimited | FetchError::Transport(_) | FetchError::Decode(_) => true,
        }
    }

    /// Run `operation` until it succeeds, a non-retryable error occurs, or attempts run out.
    ///
    /// Every attempt is preceded by jitter; every retried failure is followed by
    /// the current backoff, which then doubles. The final error is returned as-is.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt_fn: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut attempt = 1;

        loop {
            tokio::time::sleep(self.jitter()).await;

            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts || !self.is_retryable(&e) => {
                    debug!(operation, attempt, error = %e, "Giving up");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    metrics::inc_retries(operation);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            Duration::from_millis(500),
            Duration::from_millis(50),
            Duration::from_millis(150),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn jitter_stays_in_range() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let j = policy.jitter();
            assert!(j >= Duration::from_millis(50) && j <= Duration::from_millis(150));
        }
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(fast_policy(0).max_attempts(), 1);
    }

    #[test]
    fn status_predicate_is_respected() {
        let policy = RetryPolicy::default().with_retryable_status(throttled_or_server_error);
        assert!(policy.is_retryable(&FetchError::Status(503)));
        assert!(!policy.is_retryable(&FetchError::Status(404)));
        assert!(policy.is_retryable(&FetchError::RateLimited));

        assert!(RetryPolicy::default().is_retryable(&FetchError::Status(404)));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(FetchError::RateLimited)
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(3)
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Status(500))
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status(500))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy(3).with_retryable_status(throttled_or_server_error);
        let result: Result<(), _> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Status(404))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
