//! Exponential backoff schedule for rate-limited generation calls.
//!
//! The policy only computes waits; the caller owns the loop because what
//! counts as "retry" differs (a 429 waits, a malformed plan retries at once).

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_BASE_WAIT_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Attempt `i` (0-based) waits `base_wait_secs ^ i` units after a 429.
    #[serde(default = "default_base_wait_secs")]
    pub base_wait_secs: u64,

    /// Length of one wait unit. Always one second outside tests.
    #[serde(skip, default = "default_wait_unit")]
    pub wait_unit: Duration,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_wait_secs() -> u64 {
    DEFAULT_BASE_WAIT_SECS
}

fn default_wait_unit() -> Duration {
    Duration::from_secs(1)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_wait_secs: DEFAULT_BASE_WAIT_SECS,
            wait_unit: default_wait_unit(),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_wait_secs(mut self, base: u64) -> Self {
        self.base_wait_secs = base;
        self
    }

    pub fn with_wait_unit(mut self, unit: Duration) -> Self {
        self.wait_unit = unit;
        self
    }

    /// Wait in whole units before retrying attempt `attempt` (0-based).
    pub fn wait_units(&self, attempt: u32) -> u64 {
        self.base_wait_secs.saturating_pow(attempt)
    }

    pub fn wait_for_attempt(&self, attempt: u32) -> Duration {
        let units = u32::try_from(self.wait_units(attempt)).unwrap_or(u32::MAX);
        self.wait_unit.saturating_mul(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (0..policy.max_retries)
            .map(|i| policy.wait_for_attempt(i).as_secs())
            .collect();
        assert_eq!(waits, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn test_zero_unit_never_sleeps() {
        let policy = RetryPolicy::new()
            .with_base_wait_secs(3)
            .with_wait_unit(Duration::ZERO);
        assert_eq!(policy.wait_units(2), 9);
        assert_eq!(policy.wait_for_attempt(2), Duration::ZERO);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"maxRetries": 2}"#).unwrap();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_wait_secs, 2);
        assert_eq!(policy.wait_unit, Duration::from_secs(1));
    }
}
