//! Classification of provider call results.
//!
//! Rules, first match wins:
//! 1. timeout exception → retriable
//! 2. any other exception → terminal
//! 3. body reports success → success
//! 4. status 429/500/502/503/504 → retriable
//! 5. anything else → terminal

use crate::error::{DecodeError, TransportError};
use crate::transport::DecodedBody;

/// Status codes worth another attempt.
pub const RETRIABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Exception raised by the call, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    None,
    Timeout,
    Other,
}

/// Everything observed about one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    pub body_result: bool,
    pub status_code: Option<u16>,
    pub exception: ExceptionKind,
    /// Human-readable reason reported to the ledger.
    pub reason: String,
}

impl CallOutcome {
    /// Outcome of a call that produced a response.
    ///
    /// An undecodable body counts as `body_result = false` with a synthetic
    /// reason; the status code still decides between retry and stop.
    pub fn from_response(status: u16, decoded: Result<DecodedBody, DecodeError>) -> Self {
        let (body_result, reason) = match decoded {
            Ok(body) if body.message.is_empty() => (body.success, format!("status {status}")),
            Ok(body) => (body.success, body.message),
            Err(e) => (false, format!("{e} (status {status})")),
        };

        Self {
            body_result,
            status_code: Some(status),
            exception: ExceptionKind::None,
            reason,
        }
    }

    /// Outcome of a call that raised instead of responding.
    pub fn from_error(err: &TransportError) -> Self {
        let (exception, reason) = if err.is_timeout() {
            (ExceptionKind::Timeout, err.to_string())
        } else {
            (ExceptionKind::Other, format!("provider call failed: {err}"))
        };

        Self {
            body_result: false,
            status_code: None,
            exception,
            reason,
        }
    }
}

/// Classified result of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    RetriableFailure,
    TerminalFailure,
    /// The call neither responded with a status nor raised.
    Indeterminate,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::RetriableFailure => "retriable",
            Outcome::TerminalFailure => "terminal",
            Outcome::Indeterminate => "indeterminate",
        }
    }
}

pub fn is_retriable_status(status: u16) -> bool {
    RETRIABLE_STATUS_CODES.contains(&status)
}

pub fn classify(outcome: &CallOutcome) -> Outcome {
    match outcome.exception {
        ExceptionKind::Timeout => return Outcome::RetriableFailure,
        ExceptionKind::Other => return Outcome::TerminalFailure,
        ExceptionKind::None => {}
    }

    if outcome.body_result {
        return Outcome::Success;
    }

    match outcome.status_code {
        Some(status) if is_retriable_status(status) => Outcome::RetriableFailure,
        Some(_) => Outcome::TerminalFailure,
        None => Outcome::Indeterminate,
    }
}
