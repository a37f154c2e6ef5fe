//! Order API Server
//!
//! Serves the order store over HTTP, backed by Redis.
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Installs tracing and the Prometheus metrics recorder
//! - Connects to Redis and verifies it answers before accepting requests
//! - Serves the HTTP API until Ctrl+C or SIGTERM
//!
//! # Usage
//!
//! ```bash
//! # Start Redis
//! docker run --rm -p 6379:6379 redis:7
//!
//! # Run server
//! cargo run --bin order-api-server
//! ```

mod config;
mod metrics;

use anyhow::Context;
use config::Config;
use order_api_core::OrderStore;
use order_api_redis::RedisBackend;
use order_api_web::{app_router, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,order_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = ?e, "Order API server failed");
        return Err(e);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    info!("Starting order API server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        redis = %config.redis.url,
        addr = %config.server.addr(),
        operation_timeout = ?config.store.operation_timeout,
        "Configuration loaded"
    );

    let metrics = metrics::install_recorder().context("Failed to install metrics recorder")?;

    // The store must be reachable before the listener is bound
    let backend = RedisBackend::connect(&config.redis.url, config.redis.connect_timeout)
        .await
        .context("Redis startup health check failed")?;
    let store = OrderStore::new(Arc::new(backend)).with_deadline(config.store.operation_timeout);
    info!("✓ Order store ready");

    let state = AppState::new(store)
        .with_page_sizes(config.store.page_size_default, config.store.page_size_max)
        .with_metrics(metrics);
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr()))?;
    info!(addr = %config.server.addr(), "Order API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// If a handler cannot be installed, that signal is logged and ignored so
/// the server keeps running until the other one arrives.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
