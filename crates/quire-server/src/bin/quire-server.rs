//! `quire-server`: serve records and accept authenticated updates.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use quire_server::{routes, telemetry, ServerConfig, ServerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    telemetry::init(config.json_logs);

    tracing::info!("quire server v{} starting", env!("CARGO_PKG_VERSION"));

    let ctx = Arc::new(ServerContext::open(&config)?);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    routes::serve(listener, ctx, shutdown_signal()).await?;

    // The store closes when the last context reference drops.
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("interrupt received, draining connections");
}
