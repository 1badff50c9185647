//! In-process ledger.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerEvent};
use crate::payments::types::PaymentId;

/// Keeps every event per payment, in report order.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    events: DashMap<PaymentId, Vec<LedgerEvent>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events reported for one payment.
    pub fn events(&self, payment_id: &PaymentId) -> Vec<LedgerEvent> {
        self.events
            .get(payment_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    pub fn processing_events(&self, payment_id: &PaymentId) -> Vec<LedgerEvent> {
        self.events(payment_id)
            .into_iter()
            .filter(LedgerEvent::is_processing)
            .collect()
    }

    /// Number of payments with at least one event.
    pub fn payment_count(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, event: LedgerEvent) -> Result<(), LedgerError> {
        self.events
            .entry(event.payment_id().clone())
            .or_default()
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_events_kept_per_payment_in_order() {
        let ledger = MemoryLedger::new();
        let a = PaymentId::from("a");
        let b = PaymentId::from("b");
        let tx = Uuid::new_v4();

        ledger
            .report_submission(&a, tx, true, SystemTime::now(), Duration::ZERO)
            .await
            .unwrap();
        ledger
            .report_processing(&a, tx, false, SystemTime::now(), "503")
            .await
            .unwrap();
        ledger
            .report_processing(&a, tx, true, SystemTime::now(), "ok")
            .await
            .unwrap();

        let events = ledger.events(&a);
        assert_eq!(events.len(), 3);
        assert!(!events[0].is_processing());
        assert_eq!(ledger.processing_events(&a).len(), 2);
        assert!(ledger.events(&b).is_empty());
        assert_eq!(ledger.payment_count(), 1);
    }
}
