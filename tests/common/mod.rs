//! Shared harness for attempt-loop, load and transport tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use payment_relay::admission::{AdmissionGate, ConcurrencyGate, SemaphoreGate, WindowRateLimiter};
use payment_relay::error::TransportError;
use payment_relay::ledger::{LedgerEvent, MemoryLedger};
use payment_relay::payments::{PaymentOrchestrator, PaymentRequest};
use payment_relay::resilience::LatencyEstimator;
use payment_relay::transport::{RawResponse, Transport};
use payment_relay::{PaymentId, PaymentProvider, RelayConfig};

pub const APPROVED: &str = r#"{"success": true, "message": "approved"}"#;
pub const BUSY: &str = r#"{"success": false, "message": "provider busy"}"#;
pub const DECLINED: &str = r#"{"success": false, "message": "card declined"}"#;

/// One scripted provider reaction.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, &'static str),
    Slow(Duration, u16, &'static str),
    Timeout,
    Fail(&'static str),
}

/// Transport that plays back a fixed script, then keeps answering `fallback`.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Reply>) -> Self {
        Self::with_fallback(script, Reply::Fail("script exhausted"))
    }

    pub fn with_fallback(script: Vec<Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(
        &self,
        request: &PaymentRequest,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Status(status, body) => Ok(RawResponse::new(status, body)),
            Reply::Slow(delay, status, body) => {
                tokio::time::sleep(delay).await;
                Ok(RawResponse::new(status, body))
            }
            Reply::Timeout => Err(TransportError::Timeout(0)),
            Reply::Fail(message) => Err(TransportError::Other(message.to_string())),
        }
    }
}

/// Semaphore slots that count every acquire and release.
pub struct CountingGate {
    inner: SemaphoreGate,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl CountingGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: SemaphoreGate::new(capacity),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConcurrencyGate for CountingGate {
    async fn try_acquire(&self, timeout: Duration) -> bool {
        let ok = self.inner.try_acquire(timeout).await;
        if ok {
            self.acquired.fetch_add(1, Ordering::SeqCst);
        }
        ok
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release();
    }
}

/// A provider wired to scripted collaborators.
pub struct Harness {
    pub provider: PaymentProvider,
    pub transport: Arc<ScriptedTransport>,
    pub ledger: Arc<MemoryLedger>,
    pub slots: Arc<CountingGate>,
}

pub struct HarnessBuilder {
    config: RelayConfig,
    transport: ScriptedTransport,
}

impl HarnessBuilder {
    pub fn new(average_processing_ms: u64, transport: ScriptedTransport) -> Self {
        let mut config = RelayConfig::default();
        config.provider.name = "test-provider".into();
        config.provider.average_processing_time_ms = average_processing_ms;
        config.provider.rate_limit_per_sec = 1_000;
        config.provider.parallel_requests = 8;
        Self { config, transport }
    }

    pub fn parallel(mut self, slots: usize) -> Self {
        self.config.provider.parallel_requests = slots;
        self
    }

    pub fn rate(mut self, per_sec: u32) -> Self {
        self.config.provider.rate_limit_per_sec = per_sec;
        self
    }

    pub fn build(self) -> Harness {
        let provider_config = &self.config.provider;
        let transport = Arc::new(self.transport);
        let ledger = Arc::new(MemoryLedger::new());
        let slots = Arc::new(CountingGate::new(provider_config.parallel_requests));

        let latency = Arc::new(LatencyEstimator::new(
            provider_config.average_processing_time(),
            &self.config.latency,
        ));
        let gate = Arc::new(AdmissionGate::new(
            provider_config.name.clone(),
            slots.clone(),
            Arc::new(WindowRateLimiter::per_second(provider_config.rate_limit_per_sec)),
        ));
        let orchestrator = PaymentOrchestrator::new(
            provider_config,
            latency,
            gate,
            transport.clone(),
            ledger.clone(),
        );

        Harness {
            provider: PaymentProvider::new(orchestrator, provider_config),
            transport,
            ledger,
            slots,
        }
    }
}

impl Harness {
    /// `(success, reason)` of every processing event for a payment.
    pub fn processing(&self, payment_id: &PaymentId) -> Vec<(bool, String)> {
        self.ledger
            .processing_events(payment_id)
            .into_iter()
            .filter_map(|event| match event {
                LedgerEvent::Processing {
                    success, reason, ..
                } => Some((success, reason)),
                LedgerEvent::Submission { .. } => None,
            })
            .collect()
    }

    pub fn submissions(&self, payment_id: &PaymentId) -> usize {
        self.ledger
            .events(payment_id)
            .iter()
            .filter(|event| !event.is_processing())
            .count()
    }

    pub fn assert_slots_balanced(&self) {
        assert_eq!(
            self.slots.acquired(),
            self.slots.released(),
            "every acquired slot must be released"
        );
        assert_eq!(self.provider.gate().held(), 0);
    }
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        402 => "402 Payment Required",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        504 => "504 Gateway Timeout",
        _ => "500 Internal Server Error",
    }
}

/// Start a programmable mock provider on an ephemeral port.
///
/// `f` receives the request line (e.g. `POST /pay?paymentId=.. HTTP/1.1`).
pub async fn start_programmable_provider<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let head = String::from_utf8_lossy(&buf[..n]);
                        let request_line = head.lines().next().unwrap_or_default().to_string();

                        let (status, body) = f(request_line).await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_line(status),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
