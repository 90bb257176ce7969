//! Retry logic with exponential backoff
//!
//! Shared by provider calls and content fetching.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = single attempt)
    pub max_retries: u32,

    /// Initial delay between retries (milliseconds)
    pub initial_delay_ms: u64,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,

    /// Maximum delay between retries (milliseconds)
    pub max_delay_ms: u64,

    /// Spread delays by ±20%
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            backoff_multiplier: 2.0,
            max_delay_ms: 10_000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Millisecond delays, for tests and local endpoints
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            jitter: false,
            ..Default::default()
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay_ms as f64);

        let delay = if self.jitter {
            capped * (0.8 + jitter_fraction() * 0.4)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }
}

/// Cheap pseudo-random fraction in [0, 1)
fn jitter_fraction() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClassification {
    /// Transient
    Retry,

    /// Permanent
    NoRetry,

    /// Rate limited - use provided delay if available
    RateLimited { retry_after_ms: Option<u64> },
}

/// Errors that can be classified for retry
pub trait RetryableError {
    fn classify(&self) -> RetryClassification;
}

/// Execute an async operation with retry logic
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: RetryableError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let classification = err.classify();
        if classification == RetryClassification::NoRetry {
            debug!(
                "{}: non-retryable error on attempt {}: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        if attempt >= config.max_retries {
            warn!(
                "{}: giving up after {} attempts: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        let delay = match classification {
            RetryClassification::RateLimited {
                retry_after_ms: Some(ms),
            } => Duration::from_millis(ms.min(config.max_delay_ms)),
            _ => config.delay_for_attempt(attempt),
        };

        warn!(
            "{}: attempt {} failed, retrying in {:?}: {}",
            operation_name,
            attempt + 1,
            delay,
            err
        );

        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            initial_delay_ms: 1000,
            backoff_multiplier: 2.0,
            max_delay_ms: 30000,
            jitter: false,
            ..Default::default()
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(5), Duration::from_millis(30000));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&RetryConfig::immediate(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::ServerError("503".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&RetryConfig::immediate(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Authentication("bad key".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&RetryConfig::immediate(2), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Network("reset".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
