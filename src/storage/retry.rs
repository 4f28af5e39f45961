//! Bounded retry with exponential backoff for the persistent backend
//!
//! Only connectivity failures are retried; a query error means the
//! translation is wrong and repeating it cannot help.

use super::traits::StorageResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Cap on the delay between retries, in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff (e.g., 2.0 doubles delay each retry).
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Calculates the delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay_ms as f64
            * self
                .backoff_multiplier
                .powi(attempt.saturating_sub(1) as i32);
        let capped = base_delay.min(self.max_delay_ms as f64).max(0.0);

        Duration::from_millis(capped as u64)
    }

    /// Run `op`, retrying retryable failures up to `max_retries` times.
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> StorageResult<T>
    where
        F: FnMut() -> StorageResult<T>,
    {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after connectivity failure"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use std::cell::Cell;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 100,
            max_delay_ms: 350,
            backoff_multiplier: 2.0,
        };
        assert_eq!(config.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(350));
    }

    #[test]
    fn test_retries_connectivity_until_success() {
        let calls = Cell::new(0);
        let result = fast().run("lookup", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StorageError::Connectivity("busy".into()))
            } else {
                Ok(42)
            }
        });

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let result: StorageResult<()> = fast().run("lookup", || {
            calls.set(calls.get() + 1);
            Err(StorageError::Connectivity("down".into()))
        });

        assert!(matches!(result, Err(StorageError::Connectivity(_))));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_query_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: StorageResult<()> = fast().run("lookup", || {
            calls.set(calls.get() + 1);
            Err(StorageError::Query("no such column".into()))
        });

        assert!(matches!(result, Err(StorageError::Query(_))));
        assert_eq!(calls.get(), 1);
    }
}
