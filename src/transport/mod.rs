//! Provider transport boundary.
//!
//! # Data Flow
//! ```text
//! PaymentRequest + per-call timeout
//!     → Transport::call (http.rs: reqwest POST with query parameters)
//!     → RawResponse { status, body }
//!     → BodyDecoder::decode (decoder.rs: JSON {"success", "message"})
//! ```
//!
//! # Design Decisions
//! - Exactly one `call` per attempt; retries are the orchestrator's job
//! - Timeouts surface as `TransportError::Timeout` so they can be retried
//! - The wire shape lives here, never in the attempt loop

pub mod decoder;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DecodeError, TransportError};
use crate::payments::types::PaymentRequest;

pub use decoder::{DecodedBody, JsonBodyDecoder};
pub use http::HttpTransport;

/// Status and raw body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Issues a single payment call to the provider.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        request: &PaymentRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

/// Turns a raw response body into the provider's verdict.
pub trait BodyDecoder: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<DecodedBody, DecodeError>;
}
