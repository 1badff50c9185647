//! Concurrency limiting for in-flight provider calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

/// Counting slot resource.
#[async_trait]
pub trait ConcurrencyGate: Send + Sync {
    /// Take a slot, waiting at most `timeout`. Never fails, only refuses.
    async fn try_acquire(&self, timeout: Duration) -> bool;

    /// Return a slot taken by a successful `try_acquire`.
    fn release(&self);
}

/// Slots backed by a tokio semaphore.
#[derive(Debug)]
pub struct SemaphoreGate {
    semaphore: Semaphore,
    capacity: usize,
    in_flight: AtomicUsize,
}

impl SemaphoreGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ConcurrencyGate for SemaphoreGate {
    async fn try_acquire(&self, timeout: Duration) -> bool {
        let permit = if timeout.is_zero() {
            self.semaphore.try_acquire().ok()
        } else {
            match tokio::time::timeout(timeout, self.semaphore.acquire()).await {
                Ok(Ok(permit)) => Some(permit),
                _ => None,
            }
        };

        match permit {
            Some(permit) => {
                permit.forget();
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                true
            }
            None => false,
        }
    }

    fn release(&self) {
        let released = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();
        if released {
            self.semaphore.add_permits(1);
        } else {
            tracing::error!("Concurrency slot released without a matching acquire");
        }
    }
}
