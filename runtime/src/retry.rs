//! Exponential backoff with jitter for transient failures.
//!
//! The API client wraps its read requests in [`retry_with_predicate`] so a
//! flaky network or a 503 from the Ghumly backend does not surface as an
//! error on the first hiccup. Mutations (booking creation, payment
//! verification, review writes) never go through this module; an operation
//! that may have reached the server must not be silently repeated.
//!
//! Delays grow as `initial_delay * multiplier^attempt`, capped at
//! `max_delay`, and each one is scaled by a random factor in `0.5..=1.0`
//! so simultaneous clients do not hammer the backend in lockstep.

use std::future::Future;
use std::time::Duration;

/// How many times to retry and how long to wait between attempts.
///
/// The default policy (3 retries, 100ms initial delay doubling up to 30s)
/// suits background work. The API client uses a tighter policy for
/// interactive reads, built with [`RetryPolicy::builder`]:
///
/// ```
/// use ghumly_runtime::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_retries(2)
///     .initial_delay(Duration::from_millis(250))
///     .max_delay(Duration::from_secs(2))
///     .multiplier(2.0)
///     .build();
///
/// assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(250));
/// assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on the computed delay
    pub max_delay: Duration,
    /// Growth factor per attempt
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Start building a policy from the defaults.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Deterministic delay for a zero-based attempt number.
    ///
    /// Attempt 0 waits `initial_delay`; each further attempt multiplies by
    /// `multiplier`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        // Note: Precision loss acceptable for backoff arithmetic
        #[allow(clippy::cast_precision_loss)]
        let base_ms = self.initial_delay.as_millis() as f64;
        // Note: Attempt counts stay far below i32::MAX
        #[allow(clippy::cast_possible_wrap)]
        let grown = base_ms * self.multiplier.powi(attempt as i32);
        // Note: Truncation fine, delays are whole milliseconds
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(grown as u64);

        delay.min(self.max_delay)
    }

    /// [`Self::delay_for_attempt`] scaled by a random factor in `0.5..=1.0`.
    #[must_use]
    pub fn jittered_delay_for_attempt(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let base = self.delay_for_attempt(attempt);
        let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);

        // Note: Precision loss acceptable for backoff arithmetic
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        Duration::from_millis((base.as_millis() as f64 * factor) as u64)
    }
}

/// Fluent construction for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Retries after the first attempt.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Ceiling on the computed delay.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Growth factor per attempt.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = multiplier;
        self
    }

    /// Finish building.
    #[must_use]
    pub const fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Retry `operation` on every error until it succeeds or the policy is
/// exhausted.
///
/// Use this only when *any* failure of the operation is worth repeating.
/// The API client instead uses [`retry_with_predicate`] to distinguish
/// transient transport failures from definitive server answers.
///
/// # Errors
///
/// Returns the last error once `max_retries` is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_predicate(policy, operation, |_| true).await
}

/// Retry `operation`, but only while `predicate` judges the error
/// transient.
///
/// A non-retryable error (a 404, a validation rejection, an auth failure)
/// is returned immediately without sleeping. Each retry waits a jittered
/// exponential delay.
///
/// ```ignore
/// let tours = retry_with_predicate(
///     config.read_retry.clone(),
///     || client.fetch_tours_page(page),
///     ApiError::is_retryable_read,
/// )
/// .await?;
/// ```
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once
/// `max_retries` is exhausted.
pub async fn retry_with_predicate<T, E, F, Fut, P>(
    policy: RetryPolicy,
    mut operation: F,
    predicate: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt: u32 = 0;

    loop {
        metrics::counter!("retry.attempts").increment(1);

        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::debug!(attempt, "Operation succeeded after retry");
                    metrics::counter!("retry.succeeded").increment(1);
                }
                return Ok(value);
            }
            Err(error) if attempt < policy.max_retries && predicate(&error) => {
                let delay = policy.jittered_delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis(),
                    error = %error,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(attempt, error = %error, "Retries exhausted");
                    metrics::counter!("retry.exhausted").increment(1);
                } else {
                    tracing::debug!(error = %error, "Error not retryable");
                }
                return Err(error);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(max_retries)
            .initial_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .build()
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!((policy.multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_overrides_every_field() {
        let policy = RetryPolicy::builder()
            .max_retries(5)
            .initial_delay(Duration::from_millis(10))
            .max_delay(Duration::from_secs(1))
            .multiplier(3.0)
            .build();

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(10));
        assert_eq!(policy.max_delay, Duration::from_secs(1));
        assert!((policy.multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delays_double_then_hit_the_cap() {
        let policy = RetryPolicy::builder()
            .max_retries(10)
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(450))
            .multiplier(2.0)
            .build();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(450));
        assert_eq!(policy.delay_for_attempt(8), Duration::from_millis(450));
    }

    #[test]
    fn jitter_stays_within_half_to_full_delay() {
        let policy = RetryPolicy::default();
        let base = policy.delay_for_attempt(2);

        for _ in 0..50 {
            let jittered = policy.jittered_delay_for_attempt(2);
            assert!(jittered <= base);
            assert!(jittered >= base / 2);
        }
    }

    #[tokio::test]
    async fn first_attempt_success_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let result: Result<u32, String> = retry_with_backoff(quick_policy(3), move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_two_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let result: Result<&str, String> = retry_with_backoff(quick_policy(3), move || {
            let seen = Arc::clone(&seen);
            async move {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("connection reset".to_string())
                } else {
                    Ok("tours")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "tours");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let result: Result<(), String> = retry_with_backoff(quick_policy(2), move || {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Err("still down".to_string())
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "still down");
        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn predicate_blocks_non_transient_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let result: Result<(), String> = retry_with_predicate(
            quick_policy(5),
            move || {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err("404 not found".to_string())
                }
            },
            |e: &String| !e.starts_with("404"),
        )
        .await;

        assert_eq!(result.unwrap_err(), "404 not found");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn predicate_allows_transient_errors_through() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);

        let result: Result<u32, String> = retry_with_predicate(
            quick_policy(5),
            move || {
                let seen = Arc::clone(&seen);
                async move {
                    if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err("503 service unavailable".to_string())
                    } else {
                        Ok(7)
                    }
                }
            },
            |e: &String| e.starts_with("503"),
        )
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
