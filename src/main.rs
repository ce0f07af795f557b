//! UFO Collector: records new listing posts in SQLite and mirrors the file to Dropbox.
//!
//! # Usage
//!
//! ```bash
//! ufo-collector --db-path ./data/analytics.db --subreddit UFOs
//! ```
//!
//! Environment variables can also be used:
//! - `ANALYTICS_DROPBOX_ACCESS_TOKEN`: Dropbox token for backups
//! - `UFO_API_TOKEN`: Bearer token for the listing API
//! - `UFO_DB_PATH`: Datastore file
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use ufo_collector::backup::DropboxUploader;
use ufo_collector::config::Config;
use ufo_collector::ingest::{ListingClient, Poller};
use ufo_collector::observability::metrics::init_metrics_with_endpoint;
use ufo_collector::observability::tracing::init_tracing;
use ufo_collector::{EngineConfig, StorageEngine};

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_json);
    init_metrics_with_endpoint(config.otel_endpoint.as_deref());

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }

    let uploader = DropboxUploader::with_base_url(&config.dropbox_token, &config.dropbox_base_url)
        .context("building Dropbox client")?;

    let engine = StorageEngine::initialize(EngineConfig::from_config(&config), Arc::new(uploader))
        .context("initializing storage")?;

    let client = ListingClient::new(
        &config.api_base_url,
        &config.api_token,
        &config.user_agent,
        &config.subreddit,
        config.page_limit,
    )
    .context("building listing client")?;

    let poller = Poller::new(
        client,
        engine.queue(),
        config.max_pages,
        config.poll_interval(),
    );

    let shutdown = CancellationToken::new();
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    if let Err(e) = shutdown_signal().await {
        tracing::error!(error = %e, "Signal handler failed, shutting down");
    }

    // Stop ingestion first so nothing new is queued, then the storage core
    shutdown.cancel();
    if let Err(e) = poller_task.await {
        tracing::error!(error = %e, "Poller task failed");
    }

    let stats = engine.stats();
    engine.shutdown().await.context("closing storage")?;
    engine.join().await;

    tracing::info!(
        writes_applied = stats.writes_applied,
        writes_failed = stats.writes_failed,
        backups_completed = stats.backups_completed,
        backups_failed = stats.backups_failed,
        "UFO Collector shutdown complete"
    );
    Ok(())
}
