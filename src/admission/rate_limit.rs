//! Per-provider call rate limiting.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Bounded ticks per time window.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Take a tick if one is available right now.
    fn try_tick(&self) -> bool;

    /// Wait, without bound, until a tick is available and take it.
    async fn tick_blocking(&self);
}

/// Sliding-window log: at most `capacity` ticks in any `window`.
#[derive(Debug)]
pub struct WindowRateLimiter {
    capacity: usize,
    window: Duration,
    ticks: Mutex<VecDeque<Instant>>,
}

impl WindowRateLimiter {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            window,
            ticks: Mutex::new(VecDeque::with_capacity(capacity.min(4_096))),
        }
    }

    /// `rate` ticks per second.
    pub fn per_second(rate: u32) -> Self {
        Self::new(rate as usize, Duration::from_secs(1))
    }

    /// Take a tick, or report how long until the oldest one expires.
    fn acquire_or_wait(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut ticks = self.ticks.lock().unwrap_or_else(PoisonError::into_inner);

        while let Some(oldest) = ticks.front() {
            if now.duration_since(*oldest) >= self.window {
                ticks.pop_front();
            } else {
                break;
            }
        }

        if ticks.len() < self.capacity {
            ticks.push_back(now);
            return Ok(());
        }

        let wait = ticks
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or_default();
        Err(wait.max(Duration::from_millis(1)))
    }
}

#[async_trait]
impl RateLimiter for WindowRateLimiter {
    fn try_tick(&self) -> bool {
        self.acquire_or_wait().is_ok()
    }

    async fn tick_blocking(&self) {
        loop {
            match self.acquire_or_wait() {
                Ok(()) => return,
                Err(wait) => {
                    tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
