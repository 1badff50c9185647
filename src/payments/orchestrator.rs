//! Attempt loop for a single payment.
//!
//! # Responsibilities
//! - Report the submission, then drive attempts until a terminal state
//! - Gate each call behind the admission gate and the deadline
//! - Time each call with the adaptive timeout and feed the latency back
//! - Report every answered call and the final verdict to the ledger
//!
//! # Design Decisions
//! - The deadline is soft: it bounds the slot wait and is checked before
//!   each call, but neither the rate wait nor the backoff sleep is cut short
//! - A call in flight is never cancelled by the deadline, only by its timeout
//! - Timeouts are retried without a ledger event; any other transport error
//!   ends the payment with a final failure event

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rust_decimal::Decimal;
use tokio::time::Instant;
use tracing::Instrument;

use crate::admission::AdmissionGate;
use crate::config::ProviderConfig;
use crate::error::{PaymentError, TransportError};
use crate::ledger::Ledger;
use crate::observability::metrics;
use crate::payments::types::{AttemptState, PaymentAttempt, PaymentId, PaymentRequest};
use crate::resilience::{
    classify, CallOutcome, ExceptionKind, LatencyEstimator, Outcome, RetryScheduler,
};
use crate::transport::{BodyDecoder, JsonBodyDecoder, RawResponse, Transport};

/// What one pass through the loop decided.
enum Step {
    Retry,
    Done(AttemptState),
}

/// Drives payments against one provider, sharing latency and admission state.
pub struct PaymentOrchestrator {
    provider: String,
    average_processing_time: Duration,
    latency: Arc<LatencyEstimator>,
    gate: Arc<AdmissionGate>,
    transport: Arc<dyn Transport>,
    decoder: Arc<dyn BodyDecoder>,
    ledger: Arc<dyn Ledger>,
}

impl PaymentOrchestrator {
    pub fn new(
        config: &ProviderConfig,
        latency: Arc<LatencyEstimator>,
        gate: Arc<AdmissionGate>,
        transport: Arc<dyn Transport>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            provider: config.name.clone(),
            average_processing_time: config.average_processing_time(),
            latency,
            gate,
            transport,
            decoder: Arc::new(JsonBodyDecoder),
            ledger,
        }
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn BodyDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn latency(&self) -> &Arc<LatencyEstimator> {
        &self.latency
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    /// Run the whole attempt loop and return the terminal state reached.
    pub async fn process(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        started_at: Instant,
        deadline: Instant,
    ) -> AttemptState {
        let attempt = PaymentAttempt::new(payment_id, started_at, deadline);
        let span = tracing::info_span!(
            "payment",
            provider = %self.provider,
            payment_id = %attempt.payment_id,
            transaction_id = %attempt.transaction_id,
        );
        self.run(attempt, amount).instrument(span).await
    }

    async fn run(&self, attempt: PaymentAttempt, amount: Decimal) -> AttemptState {
        let request = PaymentRequest::new(&attempt, amount);

        // Init → Submitted
        let elapsed = Instant::now().saturating_duration_since(attempt.started_at);
        if let Err(e) = self
            .ledger
            .report_submission(
                &attempt.payment_id,
                attempt.transaction_id,
                true,
                SystemTime::now(),
                elapsed,
            )
            .await
        {
            tracing::error!(error = %e, "Failed to record submission");
        }

        let mut retries = RetryScheduler::new(
            attempt.started_at,
            attempt.deadline,
            self.average_processing_time,
        );
        tracing::info!(
            state = %AttemptState::Submitted,
            max_attempts = retries.max_attempts(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Payment submitted"
        );

        let state = loop {
            if !retries.has_attempts_left() {
                self.report_failure(&attempt, &PaymentError::Exhausted).await;
                break AttemptState::Exhausted;
            }

            match self.attempt_once(&attempt, &request, retries.attempt() + 1).await {
                Step::Done(state) => break state,
                Step::Retry => {
                    let delay = retries.next_backoff();
                    tracing::info!(
                        attempt = retries.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying payment"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        metrics::record_outcome(&self.provider, state.as_str());
        tracing::info!(state = %state, retries = retries.attempt(), "Payment finished");
        state
    }

    async fn attempt_once(
        &self,
        attempt: &PaymentAttempt,
        request: &PaymentRequest,
        number: u32,
    ) -> Step {
        let estimated = self
            .average_processing_time
            .max(self.latency.estimated_processing_time());

        let Some(permit) = self.gate.acquire(attempt.remaining()).await else {
            tracing::warn!(attempt = number, "No concurrency slot before deadline");
            metrics::record_admission_rejected(&self.provider, "slot_timeout");
            self.report_failure(attempt, &PaymentError::AdmissionTimeout).await;
            return Step::Done(AttemptState::DeadlineAborted);
        };

        if Instant::now() + estimated >= attempt.deadline {
            tracing::warn!(
                attempt = number,
                estimated_ms = estimated.as_millis() as u64,
                "Call cannot finish before deadline"
            );
            metrics::record_admission_rejected(&self.provider, "deadline");
            self.report_failure(attempt, &PaymentError::AdmissionTimeout).await;
            drop(permit);
            return Step::Done(AttemptState::DeadlineAborted);
        }

        let timeout = self.latency.current_timeout();
        tracing::debug!(
            state = %AttemptState::Attempting,
            attempt = number,
            timeout_ms = timeout.as_millis() as u64,
            "Calling provider"
        );

        let call_started = Instant::now();
        let call = self.transport.call(request, timeout);
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout.as_millis() as u64)),
        };
        let latency = call_started.elapsed();

        // Report, record latency, release: on every branch.
        let step = self.settle(attempt, number, result, latency).await;
        self.latency.record_latency(latency);
        metrics::record_adaptive_timeout(
            &self.provider,
            self.latency.current_timeout().as_millis() as u64,
        );
        drop(permit);
        step
    }

    /// Classify the call and report it.
    async fn settle(
        &self,
        attempt: &PaymentAttempt,
        number: u32,
        result: Result<RawResponse, TransportError>,
        latency: Duration,
    ) -> Step {
        let outcome = match result {
            Ok(response) => {
                CallOutcome::from_response(response.status, self.decoder.decode(&response.body))
            }
            Err(err) => CallOutcome::from_error(&err),
        };
        let verdict = classify(&outcome);
        metrics::record_attempt(&self.provider, verdict.as_str(), latency);

        tracing::info!(
            attempt = number,
            status = ?outcome.status_code,
            outcome = verdict.as_str(),
            latency_ms = latency.as_millis() as u64,
            reason = %outcome.reason,
            "Provider call finished"
        );

        match verdict {
            Outcome::Success => {
                self.report(attempt, true, &outcome.reason).await;
                Step::Done(AttemptState::Success)
            }
            Outcome::RetriableFailure => {
                // timeouts are retried silently
                if outcome.exception == ExceptionKind::None {
                    self.report(attempt, false, &outcome.reason).await;
                }
                let err = PaymentError::RetriableProvider(outcome.reason);
                tracing::debug!(attempt = number, error = %err, "Attempt will be retried");
                Step::Retry
            }
            Outcome::TerminalFailure | Outcome::Indeterminate => {
                let err = PaymentError::TerminalProvider(outcome.reason);
                self.report_failure(attempt, &err).await;
                Step::Done(AttemptState::TerminalFailure)
            }
        }
    }

    async fn report_failure(&self, attempt: &PaymentAttempt, err: &PaymentError) {
        self.report(attempt, false, &err.to_string()).await;
    }

    async fn report(&self, attempt: &PaymentAttempt, success: bool, reason: &str) {
        if let Err(e) = self
            .ledger
            .report_processing(
                &attempt.payment_id,
                attempt.transaction_id,
                success,
                SystemTime::now(),
                reason,
            )
            .await
        {
            tracing::error!(error = %e, success, reason, "Failed to record processing outcome");
        }
    }
}

impl std::fmt::Debug for PaymentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentOrchestrator")
            .field("provider", &self.provider)
            .field("average_processing_time", &self.average_processing_time)
            .field("gate", &self.gate)
            .finish()
    }
}
