//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt wants to call the provider:
//!     → concurrency.rs (take a slot, waiting at most the remaining time)
//!     → rate_limit.rs (take a tick; if refused, wait for the next one)
//!     → gate.rs hands back an AdmissionPermit
//!     → permit dropped → slot released
//! ```
//!
//! # Design Decisions
//! - Slot first, rate tick second; a slot held during rate back-pressure
//!   lowers effective parallelism, which keeps slot lifetime simple
//! - Slot refusal is a value (`None`), never an error
//! - Release happens in `Drop`, so every exit path returns the slot once

pub mod concurrency;
pub mod gate;
pub mod rate_limit;

pub use concurrency::{ConcurrencyGate, SemaphoreGate};
pub use gate::{AdmissionGate, AdmissionPermit};
pub use rate_limit::{RateLimiter, WindowRateLimiter};
