use std::time::Duration;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Arguments
///
/// * `retry_count` - The current retry number (0-indexed: 0 = first retry)
/// * `base` - The base delay duration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use segfetch::core::retry_delay;
///
/// assert_eq!(retry_delay(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(retry_delay(1, Duration::from_millis(100)), Duration::from_millis(200));
/// assert_eq!(retry_delay(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = 2_u32.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

/// Tracks consecutive transient failures of one segment.
///
/// Progress resets the streak, so a slow but live connection is never cut
/// off, while a dead one fails after `max_retries + 1` attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    max_retries: u32,
    failures:    u32,
}

impl RetryBudget {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            failures: 0,
        }
    }

    /// Record a failed attempt. Returns the backoff index for the next
    /// attempt, or `None` once the budget is spent.
    pub fn fail(&mut self) -> Option<u32> {
        self.failures += 1;
        if self.failures > self.max_retries {
            None
        } else {
            Some(self.failures - 1)
        }
    }

    pub fn reset(&mut self) { self.failures = 0; }

    /// Attempts made in the current failure streak.
    pub fn attempts(&self) -> u32 { self.failures }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_basic() {
        let base = Duration::from_millis(100);

        assert_eq!(retry_delay(0, base), Duration::from_millis(100));
        assert_eq!(retry_delay(1, base), Duration::from_millis(200));
        assert_eq!(retry_delay(2, base), Duration::from_millis(400));
        assert_eq!(retry_delay(3, base), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_delay_zero_base() {
        let base = Duration::from_millis(0);

        assert_eq!(retry_delay(0, base), Duration::from_millis(0));
        assert_eq!(retry_delay(10, base), Duration::from_millis(0));
    }

    #[test]
    fn test_retry_delay_overflow_protection() {
        let base = Duration::from_secs(u64::MAX / 2);

        let delay = retry_delay(40, base);
        assert!(delay > Duration::from_secs(0));
    }

    #[test]
    fn test_budget_allows_max_retries() {
        let mut budget = RetryBudget::new(3);

        assert_eq!(budget.fail(), Some(0));
        assert_eq!(budget.fail(), Some(1));
        assert_eq!(budget.fail(), Some(2));
        assert_eq!(budget.fail(), None);
        assert_eq!(budget.attempts(), 4);
    }

    #[test]
    fn test_budget_zero_retries() {
        let mut budget = RetryBudget::new(0);
        assert_eq!(budget.fail(), None);
        assert_eq!(budget.attempts(), 1);
    }

    #[test]
    fn test_budget_reset_on_progress() {
        let mut budget = RetryBudget::new(1);

        assert_eq!(budget.fail(), Some(0));
        budget.reset();
        assert_eq!(budget.fail(), Some(0));
        assert_eq!(budget.fail(), None);
    }
}
