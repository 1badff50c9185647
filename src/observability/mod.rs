//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt loop, admission gate, latency estimator produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt subscriber, filtered by RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every log line for a payment carries `payment_id` and `transaction_id`
//! - Metrics are labelled by provider name
//! - Recording metrics without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
