//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the payment relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Payment provider settings (endpoint, limits, price).
    pub provider: ProviderConfig,

    /// Latency history and adaptive timeout settings.
    pub latency: LatencyConfig,

    /// Event log settings.
    pub ledger: LedgerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Settings for the single external payment provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider identifier for logging/metrics.
    pub name: String,

    /// Base URL payments are submitted to.
    pub endpoint: String,

    /// Whether callers should route payments to this provider.
    pub enabled: bool,

    /// Fee charged by the provider per payment.
    pub price: Decimal,

    /// Maximum calls started per 1-second window.
    pub rate_limit_per_sec: u32,

    /// Maximum calls in flight at once.
    pub parallel_requests: usize,

    /// Typical provider processing time in milliseconds.
    pub average_processing_time_ms: u64,
}

impl ProviderConfig {
    pub fn average_processing_time(&self) -> Duration {
        Duration::from_millis(self.average_processing_time_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            endpoint: "http://127.0.0.1:8080/payments".to_string(),
            enabled: true,
            price: Decimal::ZERO,
            rate_limit_per_sec: 100,
            parallel_requests: 10,
            average_processing_time_ms: 1000,
        }
    }
}

/// Latency sampling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Number of most recent samples kept (oldest evicted first).
    pub sample_capacity: usize,

    /// Percentile of the samples used as the per-call timeout.
    pub percentile: f64,

    /// Number of histogram buckets spanning 0..2x average processing time.
    pub histogram_buckets: usize,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            sample_capacity: 10_000,
            percentile: 92.0,
            histogram_buckets: 1_000,
        }
    }
}

/// Event log configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LedgerConfig {
    /// Append submission/processing events as JSON lines to this file.
    pub path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
