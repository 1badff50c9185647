//! Error taxonomy for the payment attempt loop and its collaborators.

use thiserror::Error;

/// Why a payment's attempt loop ended without success.
///
/// The `Display` text of each variant is the reason written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// No concurrency slot within the remaining time, or the deadline cannot
    /// fit another call.
    #[error("deadline exceeded")]
    AdmissionTimeout,

    /// Timeout exception or retriable status code.
    #[error("retriable provider error: {0}")]
    RetriableProvider(String),

    /// Non-retriable status code or non-timeout exception.
    #[error("{0}")]
    TerminalProvider(String),

    /// Attempt budget consumed.
    #[error("max retries reached or deadline exceeded")]
    Exhausted,
}

impl PaymentError {
    /// Whether the attempt loop may continue after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, PaymentError::RetriableProvider(_))
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call did not complete within its timeout.
    #[error("provider call timed out after {0} ms")]
    Timeout(u64),

    /// Any other failure (connection refused, malformed request, ...).
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// Response body could not be decoded.
#[derive(Debug, Error)]
#[error("invalid response body: {0}")]
pub struct DecodeError(#[from] pub serde_json::Error);

/// Errors from a [`Ledger`](crate::ledger::Ledger) backend.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
