// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// How often a CRM create is attempted and how long to wait in between.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

pub trait BackoffPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

impl BackoffPolicy for RetryPolicy {
    /// Linear: after attempt 1 wait one base interval, after attempt 2 two.
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let steps = u64::try_from(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(steps))
    }
}

impl RetryPolicy {
    /// Sum of the sleeps between attempts; there is no sleep after the last.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Longest a create can take when every attempt runs into
    /// `per_attempt`.
    #[must_use]
    pub fn worst_case(&self, per_attempt: Duration) -> Duration {
        let attempts = u32::try_from(self.max_attempts).unwrap_or(u32::MAX);
        per_attempt
            .saturating_mul(attempts)
            .saturating_add(self.total_backoff())
    }
}
