use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for establishing database connections at startup.
///
/// Only connection bootstrap goes through this; request-path operations are
/// attempted exactly once.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,
    /// Growth factor applied after each failed attempt
    pub backoff_multiplier: u32,
    /// Randomize each delay into [50%, 100%] of its nominal value
    pub use_jitter: bool,
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
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

    /// Nominal delay before retry number `retry` (1-based), before jitter.
    fn nominal_delay(&self, retry: u32) -> u64 {
        let factor = u64::from(self.backoff_multiplier).saturating_pow(retry.saturating_sub(1));
        self.initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 250,
            max_delay_ms: 5000,
            backoff_multiplier: 2,
            use_jitter: true,
        }
    }
}

/// Retry an async operation with exponential backoff
///
/// # Example
/// ```ignore
/// use database::common::{retry_with_backoff, RetryConfig};
///
/// let client = retry_with_backoff(
///     || database::mongodb::connect(&url),
///     RetryConfig::new().with_max_retries(5),
/// ).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut retry_number = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retry_number > 0 {
                    debug!(retries = retry_number, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) if retry_number >= config.max_retries => {
                warn!(attempts = retry_number + 1, error = %e, "Operation failed, giving up");
                return Err(e);
            }
            Err(e) => {
                retry_number += 1;
                let nominal = config.nominal_delay(retry_number);
                let delay = if config.use_jitter {
                    apply_jitter(nominal)
                } else {
                    nominal
                };

                debug!(
                    "Operation failed (retry {}/{}): {}. Retrying in {}ms...",
                    retry_number, config.max_retries, e, delay
                );

                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }
    }
}

/// Scale a delay into [50%, 100%] of its value using a clock-seeded hash.
fn apply_jitter(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let percent = 50 + RandomState::new().hash_one(std::time::SystemTime::now()) % 51;
    delay.saturating_mul(percent) / 100
}

/// Retry with [`RetryConfig::default`].
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(|| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>("connected")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let config = RetryConfig::new().with_initial_delay(5).without_jitter();

        let result = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    let count = counter.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(format!("server selection timeout #{}", count + 1))
                    } else {
                        Ok("connected")
                    }
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_max_retries_exceeded() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_delay(5)
            .without_jitter();

        let result = retry_with_backoff(
            || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>("connection refused")
                }
            },
            config,
        )
        .await;

        assert_eq!(result.unwrap_err(), "connection refused");
        // 1 initial + 2 retries
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_nominal_delay_grows_and_caps() {
        let config = RetryConfig::new()
            .with_initial_delay(100)
            .with_max_delay(350)
            .without_jitter();

        assert_eq!(config.nominal_delay(1), 100);
        assert_eq!(config.nominal_delay(2), 200);
        assert_eq!(config.nominal_delay(3), 350);
        assert_eq!(config.nominal_delay(40), 350);
    }

    #[test]
    fn test_apply_jitter_bounds() {
        for _ in 0..20 {
            let jittered = apply_jitter(1000);
            assert!((500..=1000).contains(&jittered));
        }
    }
}
