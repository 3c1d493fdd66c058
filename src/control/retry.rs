//! Rate-limit retry policy.
//!
//! A call answered with HTTP 429 is retried once after a fixed delay. Every
//! other failure is returned as-is. If the retry fails too, the caller gets
//! [`MimirError::RetryExhausted`] wrapping the last error, so it can show a
//! "busy, try again later" message instead of a generic failure.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::telemetry;
use crate::{MimirError, Result};

/// Retry behaviour for one family of operations.
///
/// ```rust
/// # use mimir::RetryPolicy;
/// # use std::time::Duration;
/// let policy = RetryPolicy::new().delay(Duration::from_secs(2));
/// assert_eq!(policy.max_attempts, 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts including the initial request: 1 = no retry, 2 = one retry.
    /// The setter clamps to that range. Default: 2.
    pub max_attempts: u32,
    /// Fixed wait before retrying a rate-limited call. Default: 2s.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy for summary, quiz, flashcard and Q&A generation.
    pub fn ai_features() -> Self {
        Self::new()
    }

    /// Policy for document listing, upload and deletion.
    pub fn documents() -> Self {
        Self::new().delay(Duration::from_millis(5000))
    }

    /// Single attempt, rate limits surface immediately.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Enable (`2`) or disable (`1`) the single retry.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.clamp(1, 2);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run `call`, retrying after a rate limit.
    ///
    /// The `Retry-After` hint is not honoured; the wait is always
    /// [`delay`](Self::delay). An authentication failure on the retry is
    /// returned unwrapped so the session can still be cleared.
    pub async fn execute<F, Fut, T>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = call().await;
            metrics::counter!(telemetry::REQUESTS_TOTAL,
                "operation" => operation,
                "status" => if result.is_ok() { "ok" } else { "error" },
            )
            .increment(1);

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "operation" => operation)
                        .increment(1);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %e,
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(MimirError::AuthenticationFailed) => {
                    return Err(MimirError::AuthenticationFailed);
                }
                Err(e) if attempt > 1 => {
                    return Err(MimirError::RetryExhausted { last: Box::new(e) });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> MimirError {
        MimirError::RateLimited { retry_after: None }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_after_fixed_delay() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::ai_features();

        let result = policy
            .execute("summarize", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited())
                } else {
                    Ok("summary")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "summary");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn second_rate_limit_is_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::documents()
            .execute("list_documents", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match result {
            Err(MimirError::RetryExhausted { last }) => {
                assert!(matches!(*last, MimirError::RateLimited { .. }))
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn other_failure_on_retry_is_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::new()
            .execute("quiz", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited())
                } else {
                    Err(MimirError::Http("connection reset".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(MimirError::RetryExhausted { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_on_retry_passes_through() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::new()
            .execute("quiz", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited())
                } else {
                    Err(MimirError::AuthenticationFailed)
                }
            })
            .await;
        assert!(matches!(result, Err(MimirError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn fallback_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::new()
            .execute("summarize", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(MimirError::Fallback {
                    error: "AI service temporarily unavailable".into(),
                    details: None,
                })
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(MimirError::Fallback { .. })));
    }

    #[tokio::test]
    async fn disabled_surfaces_rate_limit() {
        let result: Result<()> = RetryPolicy::disabled()
            .execute("search", || async { Err(rate_limited()) })
            .await;
        assert!(matches!(result, Err(MimirError::RateLimited { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn at_most_one_retry_is_allowed() {
        assert_eq!(RetryPolicy::new().max_attempts(5).max_attempts, 2);
        assert_eq!(RetryPolicy::new().max_attempts(0).max_attempts, 1);

        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::new()
            .max_attempts(5)
            .execute("quiz", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            })
            .await;

        assert!(matches!(result, Err(MimirError::RetryExhausted { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
