//! Payment submission subsystem.
//!
//! # Data Flow
//! ```text
//! PaymentProvider::submit_payment
//!     → tokio task per payment
//!     → orchestrator.rs attempt loop
//!         → admission gate → transport → classifier → latency estimator
//!         → retry scheduler (backoff) or terminal state
//!     → ledger events (the only observable outcome)
//! ```

pub mod orchestrator;
pub mod provider;
pub mod types;

pub use orchestrator::PaymentOrchestrator;
pub use provider::PaymentProvider;
pub use types::{AttemptState, PaymentAttempt, PaymentId, PaymentRequest};
