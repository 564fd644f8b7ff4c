//! Timing configuration for the reconciliation service.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Default reconnect debounce window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Quiet period after the last reconnect signal before probing.
    pub debounce_ms: u64,
    /// Startup capture retry policy.
    pub retry: RetryPolicy,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl DriftConfig {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
