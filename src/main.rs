//! Triage server entry point
//!
//! Starts the HTTP API. For one-off analysis without a server use
//! `triage-analyze` from the `triage-cli` crate.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;

use triage::{Config, create_app, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    let config = Config::load()
        .context("Failed to load configuration. Check config/ and TRIAGE__* env vars")?;

    init_tracing(&config.logging)?;

    tracing::info!("Starting triage server...");
    tracing::info!(
        "Configuration loaded: server={}:{}, backend={:?}",
        config.server.host,
        config.server.port,
        config.storage.backend
    );

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server host {}", config.server.host))?,
        config.server.port,
    );
    let shutdown_timeout = config.server.shutdown_timeout();

    let app_handle = create_app(config)
        .await
        .context("Failed to create application")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!(
        "OpenAPI document available at http://{}/api-docs/openapi.json",
        addr
    );

    axum::serve(listener, app_handle.router)
        .with_graceful_shutdown(shutdown_signal(app_handle.shutdown_token))
        .await?;

    if tokio::time::timeout(shutdown_timeout, app_handle.worker_pool)
        .await
        .is_err()
    {
        tracing::warn!(
            "Worker pool did not stop within {:?}; running jobs are recovered on next start",
            shutdown_timeout
        );
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM, then cancel background tasks
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }

    tracing::info!("Cancelling background tasks...");
    shutdown_token.cancel();
}
