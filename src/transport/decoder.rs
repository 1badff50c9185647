//! JSON response body decoding.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::transport::BodyDecoder;

/// Provider verdict carried in the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBody {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Decodes `{"success": bool, "message": string}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyDecoder;

impl BodyDecoder for JsonBodyDecoder {
    fn decode(&self, body: &[u8]) -> Result<DecodedBody, DecodeError> {
        Ok(serde_json::from_slice(body)?)
    }
}
