//! Call pacing and retry timing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Retry timing for a single ERP call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base wait after a rate-limit response, doubled per attempt.
    pub rate_limit_base: Duration,
    /// Base wait after any other failure, doubled per attempt.
    pub transient_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base: Duration::from_secs(60),
            transient_base: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before the next attempt after `attempt` (zero-based) failed, or
    /// `None` when no attempts remain.
    pub fn next_delay(&self, attempt: u32, rate_limited: bool) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        let base = if rate_limited {
            self.rate_limit_base
        } else {
            self.transient_base
        };
        Some(base * 2u32.saturating_pow(attempt))
    }
}

/// Enforces a minimum spacing between consecutive outbound calls.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until at least `min_interval` has passed since the previous
    /// call, then record this one. Concurrent callers queue on the lock.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_backoff_doubles_from_a_minute() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0, true), Some(Duration::from_secs(60)));
        assert_eq!(policy.next_delay(1, true), Some(Duration::from_secs(120)));
        assert_eq!(policy.next_delay(2, true), None);
    }

    #[test]
    fn transient_backoff_doubles_from_a_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(0, false), Some(Duration::from_secs(1)));
        assert_eq!(policy.next_delay(1, false), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(2, false), None);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        assert_eq!(policy.next_delay(0, true), None);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_spaces_calls() {
        let throttle = Throttle::new(Duration::from_millis(100));
        let start = Instant::now();

        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));

        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(500)).await;
        let before = Instant::now();
        throttle.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
