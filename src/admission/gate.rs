//! Admission gate: concurrency slot plus rate tick, released on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::admission::concurrency::{ConcurrencyGate, SemaphoreGate};
use crate::admission::rate_limit::{RateLimiter, WindowRateLimiter};
use crate::config::ProviderConfig;
use crate::observability::metrics;

/// Shared admission control for one provider.
pub struct AdmissionGate {
    provider: String,
    slots: Arc<dyn ConcurrencyGate>,
    rate: Arc<dyn RateLimiter>,
    held: AtomicUsize,
}

impl AdmissionGate {
    pub fn new(
        provider: impl Into<String>,
        slots: Arc<dyn ConcurrencyGate>,
        rate: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            provider: provider.into(),
            slots,
            rate,
            held: AtomicUsize::new(0),
        }
    }

    /// Semaphore slots and a 1-second window sized from the provider config.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.name.clone(),
            Arc::new(SemaphoreGate::new(config.parallel_requests)),
            Arc::new(WindowRateLimiter::per_second(config.rate_limit_per_sec)),
        )
    }

    /// Wait up to `remaining` for a slot, then take a rate tick.
    ///
    /// Returns `None` if no slot frees up in time. The rate wait is not
    /// bounded by `remaining`.
    pub async fn acquire(self: &Arc<Self>, remaining: Duration) -> Option<AdmissionPermit> {
        if !self.slots.try_acquire(remaining).await {
            return None;
        }
        let held = self.held.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_inflight(&self.provider, held);
        // From here on the slot belongs to the permit.
        let permit = AdmissionPermit { gate: self.clone() };

        if !self.rate.try_tick() {
            tracing::debug!(provider = %self.provider, "Rate budget exhausted, waiting for next tick");
            self.rate.tick_blocking().await;
        }
        Some(permit)
    }

    /// Permits currently alive.
    pub fn held(&self) -> usize {
        self.held.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.slots.release();
        let held = self.held.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_inflight(&self.provider, held);
    }
}

impl std::fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("provider", &self.provider)
            .field("held", &self.held())
            .finish()
    }
}

/// A held concurrency slot. Dropping it releases the slot exactly once.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use tokio::time::Instant;

    struct Closed;

    #[async_trait]
    impl ConcurrencyGate for Closed {
        async fn try_acquire(&self, _timeout: Duration) -> bool {
            false
        }
        fn release(&self) {
            panic!("nothing was acquired");
        }
    }

    /// Refuses every non-blocking tick; the blocking wait takes 300ms.
    #[derive(Default)]
    struct Throttled {
        blocked: AtomicBool,
    }

    #[async_trait]
    impl RateLimiter for Throttled {
        fn try_tick(&self) -> bool {
            false
        }
        async fn tick_blocking(&self) {
            tokio::time::sleep(Duration::from_millis(300)).await;
            self.blocked.store(true, Ordering::SeqCst);
        }
    }

    fn gate(slots: usize, rate: u32) -> Arc<AdmissionGate> {
        Arc::new(AdmissionGate::new(
            "test",
            Arc::new(SemaphoreGate::new(slots)),
            Arc::new(WindowRateLimiter::per_second(rate)),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_releases_on_drop() {
        let gate = gate(1, 100);
        let permit = gate.acquire(Duration::from_millis(50)).await;
        assert!(permit.is_some());
        assert_eq!(gate.held(), 1);
        assert!(gate.acquire(Duration::from_millis(50)).await.is_none());

        drop(permit);
        assert_eq!(gate.held(), 0);
        assert!(gate.acquire(Duration::from_millis(50)).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_slot_returns_none() {
        let gate = Arc::new(AdmissionGate::new(
            "closed",
            Arc::new(Closed),
            Arc::new(WindowRateLimiter::per_second(10)),
        ));
        assert!(gate.acquire(Duration::from_millis(10)).await.is_none());
        assert_eq!(gate.held(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_wait_holds_slot_and_ignores_remaining() {
        let rate = Arc::new(Throttled::default());
        let gate = Arc::new(AdmissionGate::new(
            "throttled",
            Arc::new(SemaphoreGate::new(1)),
            rate.clone(),
        ));

        let start = Instant::now();
        let permit = gate.acquire(Duration::from_millis(10)).await;
        assert!(permit.is_some());
        assert!(rate.blocked.load(Ordering::SeqCst));
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert_eq!(gate.held(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_released_when_rate_wait_cancelled() {
        let gate = Arc::new(AdmissionGate::new(
            "throttled",
            Arc::new(SemaphoreGate::new(1)),
            Arc::new(Throttled::default()),
        ));

        let cancelled =
            tokio::time::timeout(Duration::from_millis(100), gate.acquire(Duration::from_secs(1))).await;
        assert!(cancelled.is_err());
        assert_eq!(gate.held(), 0);
    }
}
