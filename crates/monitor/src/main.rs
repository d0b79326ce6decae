//! Pairwatch - live monitor for newly created trading pairs
//!
//! Main entry point: wires the snapshot source, the event feed and the
//! feed session, and logs a summary line periodically.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pairwatch_feed::{
    FeedSession, FeedState, HttpSnapshotSource, SessionConfig, WsEventFeed, WsFeedConfig,
};
use pairwatch_monitor::{load_config, summary_line};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting pairwatch v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        snapshot_url = %config.feed.snapshot_url,
        events_url = %config.feed.events_url,
        "Configuration loaded"
    );

    let state = FeedState::new(config.activity.max_entries);
    let source = Arc::new(HttpSnapshotSource::new(
        config.feed.snapshot_url.clone(),
        config.feed.snapshot_timeout(),
    )?);

    // Event feed
    let (events_tx, events_rx) = mpsc::channel(config.feed.event_buffer);
    let mut feed = WsEventFeed::new(WsFeedConfig::from(&config.feed));
    let feed_handle = tokio::spawn(async move { feed.run(events_tx).await });

    // Periodic summary
    let summary_state = state.clone();
    let summary_interval = config.summary_interval();
    let summary_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(summary_interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            info!("{}", summary_line(&summary_state.summarize(), &summary_state.stats()));
        }
    });

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install signal handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Press Ctrl+C to shutdown");

    let session = FeedSession::new(SessionConfig::from(&config.feed), state.clone(), source);
    session.run(events_rx, shutdown_rx).await;

    feed_handle.abort();
    summary_handle.abort();

    info!("{}", summary_line(&state.summarize(), &state.stats()));
    info!("Shutdown complete");
    Ok(())
}
