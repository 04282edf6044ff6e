use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ledgerwatch::config::Config;
use ledgerwatch::ledger::LedgerStore;
use ledgerwatch::pipeline::TransactionPipeline;
use ledgerwatch::simulation::{generate_blacklist, Producer};
use ledgerwatch::view::QueryEngine;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Initialize structured logging (set RUST_LOG=debug for per-transaction output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    tracing::info!("Ledgerwatch starting");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load_or_default(&config_path)?;
    tracing::info!(
        threshold = config.compliance.amount_threshold,
        blacklist_mode = ?config.compliance.blacklist_mode,
        "Configuration loaded from {}",
        config_path
    );

    let store = LedgerStore::new();
    let pipeline = Arc::new(TransactionPipeline::new(&config.anomaly));

    // Session blacklist used by the producer for the whole run
    let session_blacklist = generate_blacklist(config.simulation.blacklist_size);
    tracing::info!(
        accounts = session_blacklist.len(),
        "Session blacklist drawn"
    );
    for account in session_blacklist.iter() {
        tracing::debug!(account, "Blacklisted account");
    }

    // Seed the initial history
    let mut producer = Producer::new(
        &config,
        pipeline.clone(),
        store.clone(),
        session_blacklist.clone(),
    );
    producer.seed(config.simulation.initial_transactions).await?;

    let engine = Arc::new(QueryEngine::new(
        &config,
        store.clone(),
        pipeline,
        session_blacklist,
    ));

    // Spawn API server
    if config.api.enabled {
        let host = config.api.host.clone();
        let port = config.api.port;
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = ledgerwatch::api::serve(engine, &host, port).await {
                tracing::error!(error = %e, "API server failed");
            }
        });
    }

    let shutdown = CancellationToken::new();

    // Spawn the live producer
    let producer_handle = if config.producer.enabled {
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = producer.run(shutdown).await {
                tracing::error!(error = %e, "Producer failed");
            }
        }))
    } else {
        None
    };

    tracing::info!("Simulation running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping producer...");
    shutdown.cancel();

    if let Some(handle) = producer_handle {
        let _ = handle.await;
    }

    tracing::info!(
        ledger_size = store.len().await,
        "Ledgerwatch stopped"
    );
    Ok(())
}
