use std::time::Duration;

/// Maximum number of retries for retriable catalog errors
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Base delay between retries, doubled on every attempt
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
/// Upper bound for a single backoff delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(1600);

/// Bounded exponential backoff for transient catalog failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Fail on the first transient error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (starting at 1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (1..=6).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600, 1600]);
    }

    #[test]
    fn test_large_attempts_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(64), DEFAULT_MAX_DELAY);
    }
}
