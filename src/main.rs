//! # Drover server entry point
//!
//! Starts the browser-automation gateway: wires the engine client, the
//! connection registry and the exit watchdog together, then serves JSON-RPC
//! over stdio (singleton connection) or TCP (one connection per socket).
//!
//! ## Shutdown
//! SIGINT and SIGTERM are treated identically: both start the drain sequence,
//! which races a graceful close of every connection against the configured
//! grace ceiling. The process always exits within the ceiling, even when a
//! remote session is wedged.
//!
//! ## Environment variables
//! - `DROVER_CONFIG`: path to a TOML config file; when unset, configuration
//!   comes from `DROVER_*` environment variables
//! - `DROVER_STDIO`: serve a single connection over stdin/stdout
//! - `DROVER_HOST` / `DROVER_PORT`: TCP listener address (default: 127.0.0.1:8931)
//! - `DROVER_ENGINE_URL` / `DROVER_API_KEY` / `DROVER_PROJECT_ID`: engine endpoint
//! - `RUST_LOG`: log filter (falls back to the configured log level)

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use drover::config::Config;
use drover::engine::HttpEngine;
use drover::rpc;
use drover::server::{ConnectionRegistry, ExitWatchdog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("DROVER_CONFIG") {
        Ok(path) => Config::from_file(&path)?,
        Err(_) => Config::from_env()?,
    };

    // Initialize tracing - respect RUST_LOG, fall back to the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Drover Server v{}", drover::VERSION);
    info!(
        host = %config.host,
        port = config.port,
        stdio = config.stdio,
        engine_url = %config.engine_url,
        "Configuration loaded"
    );

    // Create the engine client
    let engine = Arc::new(HttpEngine::from_config(&config)?);

    // Create the connection registry and the exit watchdog
    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let registry = Arc::new(ConnectionRegistry::new(config.clone(), engine));
    let watchdog = Arc::new(ExitWatchdog::new(Arc::clone(&registry), grace));

    // Spawn signal handler; both termination flavors start the drain
    let signal_watchdog = Arc::clone(&watchdog);
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_watchdog.drain().await;
    });

    if config.stdio {
        rpc::serve_stdio(Arc::clone(&registry), Arc::clone(&watchdog)).await?;
    } else {
        let addr = config.listen_addr()?;
        rpc::serve_tcp(addr, Arc::clone(&registry), Arc::clone(&watchdog)).await?;
    }

    // The serving loop has stopped; drain joins any in-progress shutdown
    watchdog.drain().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
