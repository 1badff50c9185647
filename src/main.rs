//! Payment relay (v1)
//!
//! Submits payments to one external provider and reports every outcome to a
//! ledger before each payment's deadline.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    PAYMENT RELAY                     │
//!                 │                                                      │
//!  submit_payment │  ┌────────────┐   ┌───────────┐   ┌──────────────┐   │
//!  ───────────────┼─▶│  attempt   │──▶│ admission │──▶│  transport   │───┼──▶ Provider
//!                 │  │   loop     │   │   gate    │   │ (adaptive    │   │
//!                 │  │            │◀──│ slot+rate │   │   timeout)   │◀──┼───
//!                 │  └─────┬──────┘   └───────────┘   └──────┬───────┘   │
//!                 │        │   retry / backoff               │ classify  │
//!                 │        ▼                                 ▼           │
//!                 │  ┌────────────┐                   ┌──────────────┐   │
//!  outcome ◀──────┼──│   ledger   │                   │   latency    │   │
//!                 │  └────────────┘                   │  estimator   │   │
//!                 │                                   └──────────────┘   │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::task::JoinSet;

use payment_relay::config::load_config;
use payment_relay::config::watcher::ConfigWatcher;
use payment_relay::ledger::{FanoutLedger, JsonLinesLedger, Ledger, MemoryLedger};
use payment_relay::observability::{logging, metrics};
use payment_relay::{PaymentId, PaymentProvider};

#[derive(Parser)]
#[command(name = "payment-relay")]
#[command(about = "Submit payments to a rate-limited provider with deadline-aware retries", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print it
    Check,
    /// Submit payments and wait for their outcomes
    Submit {
        /// Amount of each payment.
        #[arg(short, long)]
        amount: Decimal,

        /// Number of concurrent payments.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Deadline per payment, in milliseconds from submission.
        #[arg(short, long, default_value_t = 5_000)]
        deadline_ms: u64,

        /// Apply config file changes while payments run.
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        provider = %config.provider.name,
        endpoint = %config.provider.endpoint,
        parallel_requests = config.provider.parallel_requests,
        rate_limit_per_sec = config.provider.rate_limit_per_sec,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Check => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Submit {
            amount,
            count,
            deadline_ms,
            watch,
        } => {
            if config.observability.metrics_enabled {
                metrics::init_metrics(config.observability.metrics_address.parse()?);
            }

            let memory = Arc::new(MemoryLedger::new());
            let mut ledgers: Vec<Arc<dyn Ledger>> = vec![memory.clone()];
            if let Some(path) = &config.ledger.path {
                ledgers.push(Arc::new(JsonLinesLedger::open(path).await?));
            }
            let ledger = Arc::new(FanoutLedger::new(ledgers));
            let provider = PaymentProvider::from_config(&config, ledger)?;

            // Keep the watcher alive until all payments finish.
            let _watcher = if watch {
                let (watcher, mut updates) = ConfigWatcher::new(&cli.config);
                let handle = watcher.run()?;
                let live = provider.clone();
                tokio::spawn(async move {
                    while let Some(config) = updates.recv().await {
                        live.apply_config(&config.provider);
                    }
                });
                Some(handle)
            } else {
                None
            };

            if !provider.is_enabled() {
                tracing::warn!(
                    provider = %provider.provider_name(),
                    "Provider is disabled in configuration"
                );
            }

            let budget = Duration::from_millis(deadline_ms);
            let mut payments = JoinSet::new();
            for i in 0..count {
                let payment_id = PaymentId(format!("cli-{}-{}", std::process::id(), i));
                let handle = provider.submit_within(payment_id.clone(), amount, budget);
                payments.spawn(async move { (payment_id, handle.await) });
            }

            while let Some(joined) = payments.join_next().await {
                let (payment_id, state) = joined?;
                let state = state?;
                tracing::info!(payment_id = %payment_id, state = %state, "Payment outcome");
                for event in memory.events(&payment_id) {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        }
    }

    Ok(())
}
