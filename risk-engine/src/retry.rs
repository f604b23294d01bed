//! Fixed-delay retry for remote classification attempts

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Sequential retry with a constant pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one
    pub max_retries: u32,

    /// Pause before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Create a fixed-delay policy
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Upper bound on attempts, first one included
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `operation` until it succeeds, fails with a non-transient error, or
    /// the retry budget is spent. The attempt index (0-based) is passed in.
    ///
    /// Returns the last error when every attempt failed.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts() {
            if attempt > 0 {
                warn!(
                    "Retry attempt {}/{} for {} after {:?}",
                    attempt, self.max_retries, operation_name, self.delay
                );
                tokio::time::sleep(self.delay).await;
            }

            match operation(attempt).await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            "Operation {} succeeded on retry attempt {}/{}",
                            operation_name, attempt, self.max_retries
                        );
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_transient() {
                        warn!("Non-retryable error for {}: {}", operation_name, e);
                        return Err(e);
                    }

                    warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt + 1,
                        self.max_attempts(),
                        operation_name,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Internal("retry budget allowed no attempt".to_string())))
    }
}
