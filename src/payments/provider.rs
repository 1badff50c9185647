//! Caller-facing payment provider.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::admission::AdmissionGate;
use crate::config::{ProviderConfig, RelayConfig};
use crate::ledger::Ledger;
use crate::payments::orchestrator::PaymentOrchestrator;
use crate::payments::types::{AttemptState, PaymentId};
use crate::resilience::LatencyEstimator;
use crate::transport::{HttpTransport, Transport};

/// Settings that can change while payments are running.
#[derive(Debug, Clone, PartialEq)]
struct LiveSettings {
    enabled: bool,
    price: Decimal,
}

impl From<&ProviderConfig> for LiveSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            enabled: config.enabled,
            price: config.price,
        }
    }
}

/// One external payment provider. Cheap to clone; clones share all state.
#[derive(Clone, Debug)]
pub struct PaymentProvider {
    orchestrator: Arc<PaymentOrchestrator>,
    settings: Arc<ArcSwap<LiveSettings>>,
}

impl PaymentProvider {
    pub fn new(orchestrator: PaymentOrchestrator, config: &ProviderConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            settings: Arc::new(ArcSwap::from_pointee(LiveSettings::from(config))),
        }
    }

    /// Build with a custom transport and the default gate and estimator.
    pub fn with_transport(
        config: &RelayConfig,
        transport: Arc<dyn Transport>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        let provider = &config.provider;
        let latency = Arc::new(LatencyEstimator::new(
            provider.average_processing_time(),
            &config.latency,
        ));
        let gate = Arc::new(AdmissionGate::from_config(provider));
        let orchestrator = PaymentOrchestrator::new(provider, latency, gate, transport, ledger);
        Self::new(orchestrator, provider)
    }

    /// Build an HTTP-backed provider from configuration.
    pub fn from_config(config: &RelayConfig, ledger: Arc<dyn Ledger>) -> Result<Self, url::ParseError> {
        let endpoint = url::Url::parse(&config.provider.endpoint)?;
        let transport = Arc::new(HttpTransport::new(endpoint));
        Ok(Self::with_transport(config, transport, ledger))
    }

    /// Start the attempt loop on its own task.
    ///
    /// The outcome is observable through the ledger; the handle may be dropped.
    pub fn submit_payment(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        started_at: Instant,
        deadline: Instant,
    ) -> JoinHandle<AttemptState> {
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .process(payment_id, amount, started_at, deadline)
                .await
        })
    }

    /// Submit with a deadline relative to now.
    pub fn submit_within(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        budget: Duration,
    ) -> JoinHandle<AttemptState> {
        let now = Instant::now();
        self.submit_payment(payment_id, amount, now, now + budget)
    }

    /// Run the attempt loop on the current task.
    pub async fn process_payment(
        &self,
        payment_id: PaymentId,
        amount: Decimal,
        started_at: Instant,
        deadline: Instant,
    ) -> AttemptState {
        self.orchestrator
            .process(payment_id, amount, started_at, deadline)
            .await
    }

    pub fn price(&self) -> Decimal {
        self.settings.load().price
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.load().enabled
    }

    pub fn provider_name(&self) -> &str {
        self.orchestrator.provider()
    }

    pub fn latency(&self) -> &LatencyEstimator {
        self.orchestrator.latency()
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        self.orchestrator.gate()
    }

    /// Apply the live-reloadable part of a new provider config.
    pub fn apply_config(&self, config: &ProviderConfig) {
        if config.name != self.provider_name() {
            tracing::warn!(
                current = %self.provider_name(),
                reloaded = %config.name,
                "Ignoring reloaded config for a different provider"
            );
            return;
        }

        let next = LiveSettings::from(config);
        let previous = self.settings.swap(Arc::new(next.clone()));
        if *previous != next {
            tracing::info!(
                provider = %config.name,
                enabled = next.enabled,
                price = %next.price,
                "Provider settings updated"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    fn config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.provider.name = "acme".into();
        config.provider.price = Decimal::new(15, 2);
        config
    }

    #[test]
    fn test_surface() {
        let provider = PaymentProvider::from_config(&config(), Arc::new(MemoryLedger::new())).unwrap();
        assert_eq!(provider.provider_name(), "acme");
        assert_eq!(provider.price(), Decimal::new(15, 2));
        assert!(provider.is_enabled());
    }

    #[test]
    fn test_invalid_endpoint() {
        let mut config = config();
        config.provider.endpoint = "::not a url".into();
        assert!(PaymentProvider::from_config(&config, Arc::new(MemoryLedger::new())).is_err());
    }

    #[test]
    fn test_apply_config_swaps_live_settings() {
        let provider = PaymentProvider::from_config(&config(), Arc::new(MemoryLedger::new())).unwrap();
        let clone = provider.clone();

        let mut reloaded = config().provider;
        reloaded.enabled = false;
        reloaded.price = Decimal::new(20, 2);
        provider.apply_config(&reloaded);

        assert!(!clone.is_enabled());
        assert_eq!(clone.price(), Decimal::new(20, 2));

        reloaded.name = "other".into();
        reloaded.enabled = true;
        provider.apply_config(&reloaded);
        assert!(!provider.is_enabled());
    }
}
