use std::time::Duration;

use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::ApiError;

const MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounded exponential backoff, applied to idempotent reads only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.retry.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }

    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// `attempt` counts retries already made, starting at 0
    pub fn should_retry(&self, method: &Method, attempt: u32, err: &ApiError) -> bool {
        *method == Method::GET && attempt < self.max_retries && err.is_transient()
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }
}
