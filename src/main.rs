//! Caching Proxy - A concurrent forwarding HTTP proxy
//!
//! Relays GET requests to origin servers and keeps an LRU cache of responses.

use std::net::SocketAddr;
use std::process;

use clap::{error::ErrorKind, Parser};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::api::{create_router, AppState};
use caching_proxy::proxy::{ProxyContext, ProxyServer};
use caching_proxy::Config;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "caching_proxy", version)]
#[command(about = "Concurrent forwarding HTTP proxy with an LRU response cache", long_about = None)]
struct Cli {
    /// TCP port to listen on
    port: u16,
}

/// Main entry point for the proxy.
///
/// # Startup Sequence
/// 1. Parse the listen port (usage error exits with status 1)
/// 2. Initialize tracing subscriber for logging
/// 3. Load and validate configuration from environment variables
/// 4. Create the shared cache and bind the proxy listener
/// 5. Start the admin API if `ADMIN_PORT` is set
/// 6. Accept connections until SIGINT/SIGTERM
#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env(cli.port);
    if let Err(msg) = config.validate() {
        error!("Invalid configuration: {}", msg);
        process::exit(1);
    }
    info!(
        "Configuration loaded: port={}, max_cache_size={}, max_object_size={}, admin_port={:?}, io_timeout={:?}",
        config.listen_port,
        config.max_cache_size,
        config.max_object_size,
        config.admin_port,
        config.io_timeout
    );

    let ctx = ProxyContext::from_config(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let server = match ProxyServer::bind(addr, ctx.clone()).await {
        Ok(server) => server,
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    };
    info!("Proxy is up and running on {}", addr);

    let admin_handle = match config.admin_port {
        Some(port) => match spawn_admin(port, AppState::new(ctx.cache.clone())).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("{:#}", e);
                process::exit(1);
            }
        },
        None => None,
    };

    tokio::select! {
        _ = server.run() => {}
        _ = shutdown_signal() => {}
    }

    if let Some(handle) = admin_handle {
        handle.abort();
        warn!("Admin API aborted");
    }
    info!("Proxy shutdown complete");
}

/// Binds the admin API and serves it in the background.
async fn spawn_admin(port: u16, state: AppState) -> anyhow::Result<JoinHandle<()>> {
    use anyhow::Context;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("unable to start admin API on {addr}"))?;
    info!("Admin API listening on http://{}", addr);

    let app = create_router(state);
    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Admin API stopped");
        }
    }))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
