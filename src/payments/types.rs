//! Payment attempt types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Caller-supplied payment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PaymentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PaymentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One accepted payment request, fixed for the life of its attempt loop.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub payment_id: PaymentId,
    /// Generated once per payment; identical across retries.
    pub transaction_id: Uuid,
    pub started_at: Instant,
    pub deadline: Instant,
}

impl PaymentAttempt {
    pub fn new(payment_id: PaymentId, started_at: Instant, deadline: Instant) -> Self {
        Self {
            payment_id,
            transaction_id: Uuid::new_v4(),
            started_at,
            deadline,
        }
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> std::time::Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// What is sent to the provider on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub payment_id: PaymentId,
    pub transaction_id: Uuid,
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn new(attempt: &PaymentAttempt, amount: Decimal) -> Self {
        Self {
            payment_id: attempt.payment_id.clone(),
            transaction_id: attempt.transaction_id,
            amount,
        }
    }
}

/// Attempt loop state.
///
/// ```text
/// Init → Submitted → Attempting → Success
///                               → DeadlineAborted
///                               → TerminalFailure
///                               → Exhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Init,
    Submitted,
    Attempting,
    Success,
    DeadlineAborted,
    TerminalFailure,
    Exhausted,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AttemptState::Success
                | AttemptState::DeadlineAborted
                | AttemptState::TerminalFailure
                | AttemptState::Exhausted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptState::Init => "init",
            AttemptState::Submitted => "submitted",
            AttemptState::Attempting => "attempting",
            AttemptState::Success => "success",
            AttemptState::DeadlineAborted => "deadline_aborted",
            AttemptState::TerminalFailure => "terminal_failure",
            AttemptState::Exhausted => "exhausted",
        }
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
