//! Resilient call wrapper: bounded retries with exponential backoff.
//!
//! Generation jobs queue server-side for a long time, so the backoff is
//! deliberately coarse (tens of seconds): hammering an overloaded backend
//! with sub-second retries only burns quota. No jitter, no circuit breaker,
//! no per-code schedules; the policy is uniform.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{BackendError, ErrorClass};

/// Retry budget and backoff base.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the initial one included.
    pub max_attempts: u32,
    /// Backoff before the retry after failure `n` (1-indexed) is
    /// `2^n * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(15) }
    }
}

impl RetryPolicy {
    /// Backoff after the `failures`-th failed attempt (1-indexed):
    /// 30s, 60s, 120s at the default base.
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(failures)
    }
}

/// Executes one operation against the generation backend, masking transient
/// failures behind the retry budget while staying promptly cancellable.
///
/// The cancellation token is polled before each attempt and immediately
/// after any failure; an in-flight HTTP call is not interrupted, so a
/// cancelled call may still complete server-side and its result must be
/// discarded by the caller.
pub struct Retrier {
    policy: RetryPolicy,
    cancel: CancellationToken,
    status: Option<Box<dyn Fn(String) + Send + Sync>>,
}

impl std::fmt::Debug for Retrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier")
            .field("policy", &self.policy)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Retrier {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self { policy: RetryPolicy::default(), cancel, status: None }
    }

    /// Overrides the default policy (tests compress the delays).
    #[must_use]
    pub const fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets a sink receiving a human-readable status line before each
    /// backoff sleep. Not invoked on the final exhaustion.
    #[must_use]
    pub fn on_status(mut self, sink: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.status = Some(Box::new(sink));
        self
    }

    /// Runs `op` until it succeeds, fails fatally, is cancelled, or the
    /// retry budget is exhausted.
    ///
    /// # Errors
    /// - `BackendError::Cancelled` if the token is set before an attempt or
    ///   after a failure, regardless of remaining budget.
    /// - The underlying error unwrapped, if it classifies as fatal.
    /// - `BackendError::RetriesExhausted` wrapping the last transient error
    ///   once the budget is spent.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                return Err(BackendError::Cancelled);
            }

            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if self.cancel.is_cancelled() {
                return Err(BackendError::Cancelled);
            }
            match err.classify() {
                ErrorClass::Cancelled => return Err(BackendError::Cancelled),
                ErrorClass::Fatal => return Err(err),
                ErrorClass::Retryable => {},
            }
            if attempt >= max {
                return Err(BackendError::RetriesExhausted(Box::new(err)));
            }

            let delay = self.policy.delay_for(attempt);
            if let Some(sink) = &self.status {
                sink(format!(
                    "Attempt {attempt} of {max} failed; retrying in {}s",
                    delay.as_secs()
                ));
            }
            tracing::warn!(attempt, max, delay_secs = delay.as_secs(), error = %err, "backend retry");

            tokio::select! {
                () = self.cancel.cancelled() => return Err(BackendError::Cancelled),
                () = tokio::time::sleep(delay) => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    fn overloaded() -> BackendError {
        BackendError::HttpStatus { code: 503, body: "model overloaded".into() }
    }

    fn counting_retrier(cancel: CancellationToken) -> Retrier {
        // Millisecond base keeps paused-time math exact and real runs fast.
        Retrier::new(cancel)
            .with_policy(RetryPolicy { max_attempts: 3, base_delay: Duration::from_millis(15) })
    }

    #[test]
    fn backoff_schedule_doubles_from_thirty_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(30));
        assert_eq!(policy.delay_for(2), Duration::from_secs(60));
        assert_eq!(policy.delay_for(3), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_exactly_three_times_then_exhausts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let retrier = counting_retrier(CancellationToken::new());

        let result: Result<(), _> = retrier
            .run(move || {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Err(overloaded())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(BackendError::RetriesExhausted(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_the_full_schedule_between_attempts() {
        let retrier = counting_retrier(CancellationToken::new());
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = retrier.run(|| async { Err(overloaded()) }).await;

        assert!(result.is_err());
        // 2^1*15ms + 2^2*15ms, no sleep after the final failure.
        assert_eq!(started.elapsed(), Duration::from_millis(90));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_short_circuits_without_delay() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let retrier = counting_retrier(CancellationToken::new());
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = retrier
            .run(move || {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Err(BackendError::Other("invalid request".into()))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(matches!(result, Err(BackendError::Other(_))));
    }

    #[tokio::test]
    async fn pre_cancelled_token_means_zero_backend_calls() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let retrier = counting_retrier(cancel);

        let result: Result<(), _> = retrier
            .run(move || {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_failure_stops_before_any_retry() {
        let cancel = CancellationToken::new();
        let op_cancel = cancel.clone();
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let retrier = counting_retrier(cancel);

        let result: Result<(), _> = retrier
            .run(move || {
                let counted = Arc::clone(&counted);
                let op_cancel = op_cancel.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    op_cancel.cancel();
                    Err(overloaded())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn status_sink_fires_per_retry_but_not_on_exhaustion() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let retrier = counting_retrier(CancellationToken::new())
            .on_status(move |line| sink_lines.lock().unwrap().push(line));

        let result: Result<(), _> = retrier.run(|| async { Err(overloaded()) }).await;
        assert!(result.is_err());

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Attempt 1 of 3"));
        assert!(lines[0].contains("retrying in"));
        assert!(lines[1].contains("Attempt 2 of 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_transient_failures_passes_value_through() {
        let calls = Arc::new(AtomicU32::new(0));
        let counted = Arc::clone(&calls);
        let retrier = counting_retrier(CancellationToken::new());

        let result = retrier
            .run(move || {
                let counted = Arc::clone(&counted);
                async move {
                    if counted.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(overloaded())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
