//! Retry policy for control-plane calls.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use barge_control_plane::Result;

/// Exponential-randomized backoff over throttled control-plane calls.
///
/// Only the distinguished throttle error is retried; every other error
/// propagates immediately. After the final failed attempt the last error is
/// surfaced unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_interval: Duration,
    pub max_interval: Duration,
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            randomization_factor: 0.5,
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds, fails with a non-throttle error, or
    /// the attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    attempt += 1;
                    if attempt >= self.max_attempts || !error.kind().is_retryable() {
                        return Err(error);
                    }

                    let delay = self.interval(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "control plane throttled the request, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// The sleep before attempt `attempt + 1` (1-based): exponential growth
    /// from the base, randomized by the configured factor, never above the
    /// ceiling.
    fn interval(&self, attempt: u32) -> Duration {
        let ceiling = self.max_interval.as_secs_f64();
        let exponential = self.base_interval.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        let spread = 1.0 + self.randomization_factor * (2.0 * rand::random::<f64>() - 1.0);
        Duration::from_secs_f64((exponential.min(ceiling) * spread).min(ceiling))
    }
}
