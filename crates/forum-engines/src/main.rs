use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;

use mongo_store::MongoForumStore;
use sentiment_engine::SentimentEngine;
use settlement_engine::SettlementEngine;

mod config;
use config::EngineConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("Starting StockForumX background engines");

    // 2. Load and validate configuration
    let config = EngineConfig::from_env()?;
    tracing::info!("  Sweep interval: {}s", config.sweep_interval_seconds);

    // 3. Connect to the document store; a failed connection or ping is fatal
    let store = Arc::new(MongoForumStore::connect(&config.mongodb_uri).await?);
    store.ping().await?;
    tracing::info!("Connected to document store ({})", store.database_name());

    // 4. Start both engines under one shutdown handle
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let settlement = SettlementEngine::new(Arc::clone(&store));
    let sweep_period = Duration::from_secs(config.sweep_interval_seconds);
    let mut settlement_task = tokio::spawn({
        let shutdown = shutdown_rx.clone();
        async move { settlement.run(sweep_period, shutdown).await }
    });

    let sentiment = Arc::new(SentimentEngine::new(Arc::clone(&store)));
    let mut sentiment_task = tokio::spawn(sentiment.run(shutdown_rx));

    // 5. Run until a signal arrives or an engine dies. Steady state never exits.
    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT"),
        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        joined = &mut settlement_task => {
            joined?;
            return Err(anyhow!("settlement engine exited unexpectedly"));
        }
        joined = &mut sentiment_task => {
            joined??;
            return Err(anyhow!("sentiment engine exited unexpectedly"));
        }
    }

    // 6. Cooperative shutdown: finish in-flight work, release subscriptions
    tracing::info!("Shutting down gracefully...");
    shutdown_tx.send(true).ok();
    let _ = settlement_task.await;
    let _ = sentiment_task.await;

    tracing::info!("Engines shut down.");
    Ok(())
}
