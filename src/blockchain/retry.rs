use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use crate::config::{ExplorerConfig, RetryConfig};
use crate::utils::{ForensicsError, Result};

/// Timeout plus exponential backoff with full jitter for upstream calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &ExplorerConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, explorer: &ExplorerConfig) -> Self {
        Self {
            max_retries: retry.max_retries,
            base_delay: Duration::from_millis(retry.base_delay_ms),
            max_delay: Duration::from_millis(retry.max_delay_ms),
            attempt_timeout: explorer.timeout(),
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the retry budget is spent.
    ///
    /// Only transient errors (timeouts, rate limits, 429/5xx) are retried. Once
    /// retries are exhausted the last error is reported as `UpstreamUnavailable`.
    pub async fn run<F, Fut, T>(&self, label: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match timeout(self.attempt_timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => ForensicsError::Timeout(self.attempt_timeout),
            };

            if !error.is_transient() {
                return Err(error);
            }

            if attempt >= max_attempts {
                tracing::warn!("{} failed after {} attempts: {}", label, attempt, error);
                return Err(ForensicsError::UpstreamUnavailable {
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }

            let backoff = self.backoff(attempt);
            tracing::debug!(
                "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                label,
                attempt,
                max_attempts,
                error,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }
    }

    /// random(0, min(max_delay, base_delay * 2^(attempt-1)))
    fn backoff(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let cap = self.max_delay.as_millis() as u64;
        let exp = base.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(cap);

        if capped == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=capped))
    }
}
