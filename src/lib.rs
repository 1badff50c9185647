//! Resilient client for a single rate-limited payment provider.

pub mod admission;
pub mod config;
pub mod error;
pub mod ledger;
pub mod observability;
pub mod payments;
pub mod resilience;
pub mod transport;

pub use config::schema::RelayConfig;
pub use payments::{AttemptState, PaymentId, PaymentProvider};
