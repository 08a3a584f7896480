//! Bounded exponential backoff for transient upstream failures.
//!
//! The upstream API occasionally sheds load with an "overloaded" status; a
//! single-attempt call would surface those as spurious user-facing failures.
//! [`with_backoff`] masks them behind a fixed number of attempts with
//! exponentially growing waits.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::UpstreamError;

/// Retry schedule for transient upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the retry after attempt 0; doubles each attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Wait after a failed attempt `attempt` (counted from 0):
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runs `operation` under `policy`, sleeping between retryable failures.
///
/// Non-retryable failures propagate immediately. A retryable failure on the
/// final attempt is reported as [`UpstreamError::RetriesExhausted`] carrying
/// the last failure's message.
pub async fn with_backoff<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                warn!(
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "transient completion failure"
                );
                if attempt + 1 >= policy.max_attempts {
                    return Err(UpstreamError::RetriesExhausted {
                        attempts: policy.max_attempts,
                        message: err.to_string(),
                    });
                }
                let delay = policy.delay_for(attempt);
                info!(seconds = delay.as_secs_f64(), "waiting before retry");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }

    Err(UpstreamError::RetriesExhausted {
        attempts: policy.max_attempts,
        message: "retry policy allows no attempts".to_string(),
    })
}
