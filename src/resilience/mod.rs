//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Each attempt of a payment:
//!     → timeouts.rs (per-call timeout from the latency percentile)
//!     → provider call
//!     → classifier.rs (success / retriable / terminal)
//!     → timeouts.rs (record the observed latency)
//!     → On retriable: retries.rs + backoff.rs (wait, then try again)
//! ```
//!
//! # Design Decisions
//! - Every external call has a timeout, but it adapts to observed latency
//! - The attempt budget comes from the caller's deadline, fixed once
//! - Backoff doubles without a cap; the deadline is checked before each call

pub mod backoff;
pub mod classifier;
pub mod retries;
pub mod timeouts;

pub use classifier::{classify, CallOutcome, ExceptionKind, Outcome};
pub use retries::RetryScheduler;
pub use timeouts::LatencyEstimator;
