//! Vehicle Telemetry Simulator Server
//!
//! Drives the simulator and inference engine on fixed cadences and serves
//! the results to dashboards over HTTP

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vts_server::{api, config::ServerConfig, scheduler, state};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Vehicle Telemetry Simulator Server");

    let config = ServerConfig::from_env()?;
    info!(?config, "Configuration loaded");

    // Create application state
    let state = state::AppState::new(&config);

    // Build the router
    let app = api::create_router(state.clone());

    // Start scheduler in background
    let cancel = CancellationToken::new();
    let scheduler = tokio::spawn(scheduler::run(state.clone(), config.clone(), cancel.clone()));

    // Start server
    info!("Server listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    scheduler.await?;

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();
}
