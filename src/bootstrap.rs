use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

const DEFAULT_LOG_FILTER: &str = "info,pizza_shop=debug,tower_http=info";

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads `.env` into the process environment when the file exists.
pub fn init_env() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => tracing::debug!("No .env file found"),
        Err(err) => tracing::warn!("Failed to load .env file: {}", err),
    }
}

/// Binds the listener and serves `app` until Ctrl-C is received.
pub async fn bootstrap(service_name: &str, app: Router, server: &ServerConfig) -> Result<()> {
    let address = server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("{} listening on {}", service_name, address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("{} stopped", service_name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
    tracing::info!("Shutdown signal received");
}
