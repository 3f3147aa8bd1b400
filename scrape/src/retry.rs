use std::time::Duration;

/// Exponential backoff with a base delay, a growth factor, and a hard cap.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub factor: u32,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            factor: 2,
            max_attempts: 3,
        }
    }
}

impl RetryConfig {
    /// Delay before the given attempt (0-indexed: 0 is the first retry after the initial try).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exponential_ms = base_ms.saturating_mul((self.factor as u64).saturating_pow(attempt));
        Duration::from_millis(exponential_ms.min(self.max_delay.as_millis() as u64))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_each_attempt() {
        let cfg = RetryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            factor: 2,
            max_attempts: 5,
        };
        assert_eq!(cfg.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(cfg.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(cfg.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn backoff_is_capped() {
        let cfg = RetryConfig {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            factor: 2,
            max_attempts: 10,
        };
        assert_eq!(cfg.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn default_allows_three_attempts() {
        let cfg = RetryConfig::default();
        assert!(cfg.should_retry(0));
        assert!(cfg.should_retry(1));
        assert!(!cfg.should_retry(2));
    }
}
