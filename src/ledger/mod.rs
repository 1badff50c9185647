//! Durable record of payment outcomes.
//!
//! # Data Flow
//! ```text
//! Attempt loop
//!     → report_submission (once, after the transaction id is generated)
//!     → report_processing (per answered call, plus the final verdict)
//!     → memory.rs (in-process, queryable)
//!     → jsonl.rs (append-only file)
//!     → FanoutLedger (several of the above, in order)
//! ```
//!
//! # Design Decisions
//! - The ledger is the only place a payment's outcome is observable
//! - Repeated reports for the same payment are appended, never merged
//! - A failing ledger is logged by the caller and does not stop the loop

pub mod jsonl;
pub mod memory;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::payments::types::PaymentId;

pub use jsonl::JsonLinesLedger;
pub use memory::MemoryLedger;

/// One reported event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Submission {
        payment_id: PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at_ms: u64,
        elapsed_ms: u64,
    },
    Processing {
        payment_id: PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at_ms: u64,
        reason: String,
    },
}

impl LedgerEvent {
    pub fn submission(
        payment_id: &PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at: SystemTime,
        elapsed: Duration,
    ) -> Self {
        LedgerEvent::Submission {
            payment_id: payment_id.clone(),
            transaction_id,
            success,
            recorded_at_ms: epoch_millis(recorded_at),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn processing(
        payment_id: &PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at: SystemTime,
        reason: &str,
    ) -> Self {
        LedgerEvent::Processing {
            payment_id: payment_id.clone(),
            transaction_id,
            success,
            recorded_at_ms: epoch_millis(recorded_at),
            reason: reason.to_string(),
        }
    }

    pub fn payment_id(&self) -> &PaymentId {
        match self {
            LedgerEvent::Submission { payment_id, .. } | LedgerEvent::Processing { payment_id, .. } => {
                payment_id
            }
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, LedgerEvent::Processing { .. })
    }
}

fn epoch_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Sink for submission and processing events.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append an already-built event.
    async fn append(&self, event: LedgerEvent) -> Result<(), LedgerError>;

    async fn report_submission(
        &self,
        payment_id: &PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at: SystemTime,
        elapsed: Duration,
    ) -> Result<(), LedgerError> {
        self.append(LedgerEvent::submission(
            payment_id,
            transaction_id,
            success,
            recorded_at,
            elapsed,
        ))
        .await
    }

    async fn report_processing(
        &self,
        payment_id: &PaymentId,
        transaction_id: Uuid,
        success: bool,
        recorded_at: SystemTime,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.append(LedgerEvent::processing(
            payment_id,
            transaction_id,
            success,
            recorded_at,
            reason,
        ))
        .await
    }
}

/// Reports every event to each inner ledger in turn.
///
/// All ledgers are attempted; the first error is returned.
#[derive(Default, Clone)]
pub struct FanoutLedger {
    ledgers: Vec<Arc<dyn Ledger>>,
}

impl FanoutLedger {
    pub fn new(ledgers: Vec<Arc<dyn Ledger>>) -> Self {
        Self { ledgers }
    }
}

#[async_trait]
impl Ledger for FanoutLedger {
    async fn append(&self, event: LedgerEvent) -> Result<(), LedgerError> {
        let mut first_err = None;
        for ledger in &self.ledgers {
            if let Err(e) = ledger.append(event.clone()).await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
