use std::time::Duration;

use tracing::warn;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed pause between attempts. No jitter.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Runs `op`, retrying only on `RateLimited`. Any other error returns at once.
/// Once attempts are exhausted the last rate-limit error is returned as-is.
pub fn with_rate_limit_retry<T, F>(
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
    mut op: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(err) if err.is_rate_limited() && attempt < attempts => {
                warn!(
                    error = %err,
                    attempt,
                    max_attempts = attempts,
                    delay_secs = policy.delay.as_secs_f64(),
                    "rate limited, retrying"
                );
                sleeper.sleep(policy.delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}
