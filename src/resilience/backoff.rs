//! Exponential backoff between retriable attempts.

use std::time::Duration;

/// Delay before the retry that follows failed attempt number `retry` (0-based).
///
/// `initial * 2^retry`, uncapped and without jitter. Saturates at
/// `Duration::MAX` instead of overflowing.
pub fn calculate_backoff(retry: u32, initial: Duration) -> Duration {
    2u32.checked_pow(retry)
        .and_then(|factor| initial.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

/// Initial backoff delay: a quarter of the average processing time.
pub fn initial_backoff(average_processing_time: Duration) -> Duration {
    average_processing_time / 4
}
