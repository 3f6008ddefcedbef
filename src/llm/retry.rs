//! Exponential backoff retry around a whole fallible async operation.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::{error, info, warn};

/// Defaults: 3 total attempts, base 1s, 1.5x growth.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY_MS: u64 = 1000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

/// Upper bound for a single wait, however large the multiplier.
const MAX_INTERVAL_SECS: u64 = 60;

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Build a policy, clamping attempts to at least 1 and the multiplier to at least 1.0.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        let backoff_multiplier = if backoff_multiplier.is_finite() {
            backoff_multiplier.max(1.0)
        } else {
            DEFAULT_BACKOFF_MULTIPLIER
        };
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_multiplier,
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * multiplier^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(MAX_INTERVAL_SECS as f64))
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            randomization_factor: 0.0,
            multiplier: self.backoff_multiplier,
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_DELAY_MS),
            DEFAULT_BACKOFF_MULTIPLIER,
        )
    }
}

/// Retry an async operation with exponential backoff.
///
/// `operation` is called up to `policy.max_attempts` times, strictly one after
/// another. Every error is retried regardless of kind. After the final failure
/// `wrap_exhausted` receives the last error and the attempt count and builds the
/// terminal error for the caller's error type.
pub async fn execute_with_retry<T, E, Fut, F, W>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    W: FnOnce(E, u32) -> E,
{
    let mut backoff = policy.backoff();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        info!("{} - Attempt {}/{}", label, attempt, max_attempts);

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        error!("{} failed on attempt {}/{}: {}", label, attempt, max_attempts, err);

        if attempt >= max_attempts {
            error!("{} failed after {} attempts. Last error: {}", label, attempt, err);
            return Err(wrap_exhausted(err, attempt));
        }

        let wait = backoff
            .next_backoff()
            .unwrap_or_else(|| policy.delay_for(attempt));
        info!("Retrying {} in {}ms...", label, wait.as_millis());
        tokio::time::sleep(wait).await;
    }
}

/// Like [`execute_with_retry`], logging a warning whenever `is_retryable`
/// rejects an error that is going to be retried anyway.
pub async fn execute_with_retry_noting<T, E, Fut, F, W, R>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    W: FnOnce(E, u32) -> E,
    R: Fn(&E) -> bool,
{
    let is_retryable = &is_retryable;
    execute_with_retry(
        label,
        policy,
        move || {
            let fut = operation();
            async move {
                let result = fut.await;
                if let Err(e) = &result
                    && !is_retryable(e)
                {
                    warn!("{} hit a non-transient error that will not go away on retry: {}", label, e);
                }
                result
            }
        },
        wrap_exhausted,
    )
    .await
}
