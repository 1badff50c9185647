//! Adaptive per-call timeout derived from observed latency.
//!
//! # Responsibilities
//! - Keep the most recent `sample_capacity` round-trip latencies (FIFO)
//! - Derive the per-call timeout as a percentile of those samples
//! - Provide the processing-time estimate used by the pre-call deadline check
//!
//! # Design Decisions
//! - Samples feed a fixed-resolution histogram over `[0, 2 x average]`;
//!   insert and evict touch one bucket each, so the percentile walk costs
//!   O(buckets) no matter how many samples are kept
//! - Readers load atomic snapshots and never wait on the sample lock; an
//!   in-flight call may use a timeout that is one update stale

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::config::LatencyConfig;

/// Marks "no samples yet" in the median snapshot.
const NO_SAMPLES: u64 = 0;

/// Shared latency history for one provider.
#[derive(Debug)]
pub struct LatencyEstimator {
    average_ms: u64,
    percentile: f64,
    window: Mutex<SampleWindow>,
    timeout_ms: AtomicU64,
    median_ms: AtomicU64,
}

impl LatencyEstimator {
    pub fn new(average_processing_time: Duration, config: &LatencyConfig) -> Self {
        let average_ms = (average_processing_time.as_millis() as u64).max(1);
        let upper_bound_ms = average_ms.saturating_mul(2);

        Self {
            average_ms,
            percentile: config.percentile.clamp(f64::MIN_POSITIVE, 100.0),
            window: Mutex::new(SampleWindow::new(
                config.sample_capacity.max(1),
                upper_bound_ms,
                config.histogram_buckets.max(1),
            )),
            timeout_ms: AtomicU64::new(upper_bound_ms),
            median_ms: AtomicU64::new(NO_SAMPLES),
        }
    }

    /// Record one observed round trip and refresh the timeout snapshot.
    pub fn record_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.push(ms);
        let timeout = window.percentile(self.percentile);
        let median = window.percentile(50.0);
        self.timeout_ms.store(timeout, Ordering::Release);
        self.median_ms.store(median, Ordering::Release);
    }

    /// Timeout for the next call. `2 x average` until the first sample.
    pub fn current_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Acquire))
    }

    /// `max(average, median)`; only used for the pre-call deadline check.
    pub fn estimated_processing_time(&self) -> Duration {
        let median = self.median_ms.load(Ordering::Acquire);
        Duration::from_millis(self.average_ms.max(median))
    }

    pub fn sample_count(&self) -> usize {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .len()
    }
}

/// FIFO of samples plus the bucket counts they produce.
#[derive(Debug)]
struct SampleWindow {
    capacity: usize,
    samples: VecDeque<u64>,
    buckets: Vec<u32>,
    bucket_width_ms: u64,
    upper_bound_ms: u64,
}

impl SampleWindow {
    fn new(capacity: usize, upper_bound_ms: u64, resolution: usize) -> Self {
        let bucket_width_ms = upper_bound_ms.div_ceil(resolution as u64).max(1);
        let bucket_count = (upper_bound_ms / bucket_width_ms) as usize + 1;

        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity.min(16_384)),
            buckets: vec![0; bucket_count],
            bucket_width_ms,
            upper_bound_ms,
        }
    }

    fn bucket_of(&self, ms: u64) -> usize {
        ((ms / self.bucket_width_ms) as usize).min(self.buckets.len() - 1)
    }

    fn push(&mut self, ms: u64) {
        if self.samples.len() == self.capacity {
            if let Some(oldest) = self.samples.pop_front() {
                let idx = self.bucket_of(oldest);
                self.buckets[idx] -= 1;
            }
        }
        let idx = self.bucket_of(ms);
        self.buckets[idx] += 1;
        self.samples.push_back(ms);
    }

    /// Smallest bucket value whose cumulative count reaches `ceil(p% of n)`.
    fn percentile(&self, p: f64) -> u64 {
        let n = self.samples.len();
        if n == 0 {
            return self.upper_bound_ms;
        }
        let rank = ((p * n as f64 / 100.0).ceil() as usize).clamp(1, n);

        let mut seen = 0usize;
        for (idx, count) in self.buckets.iter().enumerate() {
            seen += *count as usize;
            if seen >= rank {
                return self.bucket_value(idx);
            }
        }
        self.upper_bound_ms
    }

    /// Highest millisecond a bucket holds, within `[1, upper_bound]`.
    fn bucket_value(&self, idx: usize) -> u64 {
        let top = (idx as u64 + 1) * self.bucket_width_ms - 1;
        top.clamp(1, self.upper_bound_ms)
    }
}
