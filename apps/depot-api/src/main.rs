//! # Depot API
//!
//! HTTP/JSON server for invoices, receipts and the reorder queue.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Depot API Server                                │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► Identity ───► role pool ───► PostgreSQL   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use depot_api::auth::JwtManager;
use depot_api::config::ApiConfig;
use depot_api::{build_app, AppState};
use depot_db::ConnectionRouter;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,depot_api=debug")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Depot API server...");

    // Load configuration
    let config = ApiConfig::load().context("loading configuration")?;
    info!(port = config.http_port, "Configuration loaded");

    // Connect the three pools; migrations run on the provisioning pool
    let router = ConnectionRouter::connect(
        config.admin_db(),
        config.seller_db(),
        config.provisioning_db(),
    )
    .await
    .context("connecting to PostgreSQL")?;

    let jwt = JwtManager::new(&config.jwt.secret, config.jwt.access_lifetime_secs);
    let state = AppState::new(router.clone(), jwt);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    router.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
