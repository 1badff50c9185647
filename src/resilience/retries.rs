//! Attempt budget and retry pacing for one payment.
//!
//! # Responsibilities
//! - Fix the attempt budget from the deadline once, when the payment is submitted
//! - Hand out the backoff delay for each retriable failure, doubling every time
//!
//! # Design Decisions
//! - The budget is never recomputed; time spent waiting is not credited back
//! - Delays are not clamped to the remaining time; the deadline is only
//!   checked before each call

use std::time::Duration;
use tokio::time::Instant;

use crate::resilience::backoff::{calculate_backoff, initial_backoff};

/// Retry state owned by a single payment's attempt loop.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    max_attempts: u32,
    cur_retry: u32,
    initial_delay: Duration,
}

impl RetryScheduler {
    /// `max_attempts = floor((deadline - started_at) / average_processing_time)`.
    pub fn new(started_at: Instant, deadline: Instant, average_processing_time: Duration) -> Self {
        let window = deadline.saturating_duration_since(started_at).as_nanos();
        let per_attempt = average_processing_time.as_nanos().max(1);
        let max_attempts = u32::try_from(window / per_attempt).unwrap_or(u32::MAX);

        Self {
            max_attempts,
            cur_retry: 0,
            initial_delay: initial_backoff(average_processing_time),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of attempts already consumed.
    pub fn attempt(&self) -> u32 {
        self.cur_retry
    }

    pub fn has_attempts_left(&self) -> bool {
        self.cur_retry < self.max_attempts
    }

    /// Delay that the next retriable failure will wait.
    pub fn current_delay(&self) -> Duration {
        calculate_backoff(self.cur_retry, self.initial_delay)
    }

    /// Consume one attempt and return how long to wait before the next one.
    pub fn next_backoff(&mut self) -> Duration {
        let delay = self.current_delay();
        self.cur_retry = self.cur_retry.saturating_add(1);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(window_ms: u64, average_ms: u64) -> RetryScheduler {
        let start = Instant::now();
        RetryScheduler::new(
            start,
            start + Duration::from_millis(window_ms),
            Duration::from_millis(average_ms),
        )
    }

    #[test]
    fn test_budget_is_floor_of_window() {
        assert_eq!(scheduler(3500, 1000).max_attempts(), 3);
        assert_eq!(scheduler(999, 1000).max_attempts(), 0);
        assert_eq!(scheduler(10, 5).max_attempts(), 2);
    }

    #[test]
    fn test_deadline_before_start() {
        let start = Instant::now();
        let retries = RetryScheduler::new(start + Duration::from_secs(1), start, Duration::from_millis(100));
        assert_eq!(retries.max_attempts(), 0);
        assert!(!retries.has_attempts_left());
    }

    #[test]
    fn test_backoff_sequence_and_budget() {
        let mut retries = scheduler(3500, 1000);
        let budget = retries.max_attempts();

        assert_eq!(retries.next_backoff(), Duration::from_millis(250));
        assert_eq!(retries.next_backoff(), Duration::from_millis(500));
        assert!(retries.has_attempts_left());
        assert_eq!(retries.next_backoff(), Duration::from_millis(1000));
        assert!(!retries.has_attempts_left());

        // budget never moves
        assert_eq!(retries.max_attempts(), budget);
        assert_eq!(retries.attempt(), 3);
    }
}
