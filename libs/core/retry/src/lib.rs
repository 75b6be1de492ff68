//! Bounded retry with backoff.
//!
//! One retry policy for every connection the pipeline opens: the publisher's
//! broker connect, the ingestion loop's subscription connect, and the MongoDB
//! connector all go through [`retry_with_backoff`] with a [`RetryConfig`]
//! profile. Fixed-delay profiles come from [`RetryConfig::fixed`]; the default
//! profile is exponential with jitter.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration for connection attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,

    /// Initial delay between attempts in milliseconds.
    pub delay_ms: u64,

    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt (1.0 = fixed).
    pub backoff_multiplier: f64,

    /// Whether to add jitter to prevent thundering herd.
    pub use_jitter: bool,
}

impl RetryConfig {
    /// Default profile: 3 attempts, exponential backoff from 100ms with jitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-delay profile: `max_attempts` attempts with a constant delay.
    pub fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
            max_delay_ms: delay_ms,
            backoff_multiplier: 1.0,
            use_jitter: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

/// Retry an async operation with the given policy.
///
/// Runs `operation` up to `config.max_attempts` times total, sleeping the
/// (possibly jittered) delay between attempts. Each failed attempt is logged
/// with its attempt number. On exhaustion the last error is returned.
///
/// # Example
/// ```ignore
/// let config = RetryConfig::fixed(3, 5000);
/// let client = retry_with_backoff(|| connect(&url), config).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    let mut delay = config.delay_ms;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(attempts = attempt + 1, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;

                if attempt >= config.max_attempts {
                    warn!(
                        attempts = config.max_attempts,
                        error = %e,
                        "Operation failed, attempts exhausted"
                    );
                    return Err(e);
                }

                let current_delay = if config.use_jitter {
                    apply_jitter(delay)
                } else {
                    delay
                };

                warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = current_delay,
                    error = %e,
                    "Attempt failed, retrying"
                );

                tokio::time::sleep(Duration::from_millis(current_delay)).await;

                delay =
                    ((delay as f64 * config.backoff_multiplier) as u64).min(config.max_delay_ms);
            }
        }
    }
}

/// Retry with the default profile.
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

/// Apply jitter to a delay value to prevent thundering herd.
///
/// Uses a value between 50% and 100% of the original delay.
fn apply_jitter(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let random_factor =
        (RandomState::new().hash_one(std::time::SystemTime::now()) % 50) as f64 / 100.0 + 0.5;

    (delay as f64 * random_factor) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(|| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("success")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let config = RetryConfig::new().with_delay(10).without_jitter();

        let result = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(format!("attempt {}", count + 1))
                    } else {
                        Ok("success")
                    }
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let config = RetryConfig::fixed(4, 10);

        let result = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(format!("failure {}", n + 1))
                }
            },
            config,
        )
        .await;

        // Exactly max_attempts calls, last error surfaced.
        assert_eq!(result.unwrap_err(), "failure 4");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_fixed_profile_keeps_constant_delay() {
        let config = RetryConfig::fixed(3, 40);
        assert_eq!(config.backoff_multiplier, 1.0);
        assert!(!config.use_jitter);

        let start = std::time::Instant::now();
        let _ = retry_with_backoff(
            || async { Err::<(), _>("fail") },
            config,
        )
        .await;

        // Two sleeps of 40ms between three attempts.
        let elapsed = start.elapsed();
        assert!(elapsed.as_millis() >= 80);
        assert!(elapsed.as_millis() < 400);
    }

    #[tokio::test]
    async fn test_single_attempt_never_sleeps() {
        let config = RetryConfig::fixed(1, 5000);
        let start = std::time::Instant::now();

        let result = retry_with_backoff(|| async { Err::<(), _>("fail") }, config).await;

        assert!(result.is_err());
        assert!(start.elapsed().as_millis() < 1000);
    }

    #[test]
    fn test_apply_jitter_bounds() {
        let delay = 1000;
        for _ in 0..10 {
            let jittered = apply_jitter(delay);
            assert!(jittered >= 500);
            assert!(jittered <= 1000);
        }
    }

    #[test]
    fn test_builder() {
        let config = RetryConfig::new()
            .with_max_attempts(5)
            .with_delay(200)
            .with_max_delay(10000)
            .without_jitter();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.delay_ms, 200);
        assert_eq!(config.max_delay_ms, 10000);
        assert!(!config.use_jitter);
    }
}
