use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::types::TimingConfig;
use crate::error::{Result, ScrapeError};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Policy for reading a detail dialog whose content lags its visibility.
    pub fn extraction(timing: &TimingConfig) -> Self {
        Self::new(
            timing.extraction_attempts,
            Duration::from_millis(timing.extraction_backoff_ms),
        )
    }
}

/// Run `op` until it succeeds or `policy.max_attempts` is reached, sleeping
/// `policy.delay` between attempts. Returns the last error. Fatal errors are
/// returned at once.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;
    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            debug!(label, attempt, delay = ?policy.delay, "Retrying");
            tokio::time::sleep(policy.delay).await;
        }
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                debug!(label, attempt, error = %e, "Attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ScrapeError::Script {
        reason: format!("{label}: no attempts made"),
    }))
}
