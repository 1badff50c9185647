//! HTTP transport backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;
use crate::payments::types::PaymentRequest;
use crate::transport::{RawResponse, Transport};

/// Submits payments as `POST {endpoint}?paymentId=..&transactionId=..&amount=..`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn map_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout.as_millis() as u64)
    } else {
        TransportError::Other(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        request: &PaymentRequest,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[
                ("paymentId", request.payment_id.to_string()),
                ("transactionId", request.transaction_id.to_string()),
                ("amount", request.amount.to_string()),
            ])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| map_error(e, timeout))?;

        tracing::trace!(status, bytes = body.len(), "Provider responded");
        Ok(RawResponse::new(status, body.to_vec()))
    }
}
