use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use whois_engine::{
    config::Config,
    http::{self, AppState},
    metrics, WhoisClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("whois_engine=info,tower_http=debug")),
        )
        .init();

    // Load configuration
    let config = Arc::new(Config::load().context("loading configuration")?);
    info!("Configuration loaded successfully");

    let client = WhoisClient::from_config(config.clone())
        .await
        .context("loading server catalog and public suffix list")?;

    // Initialize metrics
    metrics::init_metrics();

    let app = http::router(AppState::new(client, config.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;

    info!("Whois engine listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("Metrics: http://{}/metrics", addr);

    // Graceful shutdown handling
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, gracefully shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
