//! mesh-node: peer discovery node.
//!
//! Runs the membership engine behind an HTTP server so other nodes can
//! exchange views with it, and serves the current view to dashboards.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mesh_core::Membership;
use mesh_node::{router, AppState, HttpTransport, NodeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let args = NodeArgs::parse();

    // Respects RUST_LOG, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,mesh_node=debug,mesh_core=debug"
    } else {
        "info,mesh_node=info,mesh_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting mesh-node");

    let config = args.membership_config()?;
    let transport = Arc::new(HttpTransport::new(config.exchange_timeout));
    let membership =
        Arc::new(Membership::new(config, transport).context("Invalid configuration")?);

    if let Some(bootstrap) = &membership.config().bootstrap_address {
        info!("Bootstrap address: {}", bootstrap);
    }

    let state = AppState::new(Arc::clone(&membership));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!("Listening on {}", args.listen);

    let tasks = membership.start();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.shutdown();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
