//! Acme Server
//!
//! Serves `/api/auth/*` and `/api/trpc/*` until Ctrl+C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! AUTH_URL=http://127.0.0.1:3001 cargo run --bin acme-server
//! ```

use acme_server::{build_app, Config};
use axum::{extract::Request, ServiceExt};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "{},acme_server=info,acme_auth=info,acme_api=info,tower_http=debug",
                config.server.log_level
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        auth_url = %config.auth.url,
        secure_cookies = config.auth.secure_cookies,
        trpc_endpoint = %config.trpc_endpoint,
        "Configuration loaded"
    );

    let app = build_app(&config)?;

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "Server listening");

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown({
            let shutdown = Arc::clone(&shutdown);
            async move {
                shutdown_signal().await;
                shutdown.notify_one();
            }
        })
        .into_future();

    let grace = Duration::from_secs(config.server.shutdown_timeout);
    tokio::select! {
        result = server => result?,
        () = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(timeout_secs = grace.as_secs(), "Connections still open, forcing shutdown");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }
    info!("Shutting down gracefully...");
}
