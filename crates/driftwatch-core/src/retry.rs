//! Bounded exponential backoff for startup baseline capture.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for startup capture.
///
/// Retry `n` (1-based) waits `initial_backoff_ms * multiplier^(n-1)`, capped
/// at `max_backoff_ms`. After `max_retries` retries the capture gives up for
/// the lifetime of the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry in milliseconds (default 1000).
    pub initial_backoff_ms: u64,
    /// Backoff multiplier per retry (default 2.0).
    pub multiplier: f64,
    /// Upper bound for a single delay in milliseconds (default 30000).
    pub max_backoff_ms: u64,
    /// Retries after the initial attempt (default 3, i.e. 4 attempts total).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1_000,
            multiplier: 2.0,
            max_backoff_ms: 30_000,
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based), or `None` once the
    /// retry budget is spent.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let raw = (self.initial_backoff_ms as f64) * self.multiplier.powi(exponent);
        let ms = (raw as u64).min(self.max_backoff_ms);
        Some(Duration::from_millis(ms))
    }

    /// Total attempts including the initial one.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
