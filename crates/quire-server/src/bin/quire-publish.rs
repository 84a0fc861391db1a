//! `quire-publish`: push a file to a quire server as a new record.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use quire_core::ContentRecord;
use quire_server::{load_secret, telemetry, PublishConfig, Publisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PublishConfig::parse();
    telemetry::init(config.json_logs);

    let secret = load_secret(&config.passfile)?;
    let body = std::fs::read_to_string(&config.file)
        .with_context(|| format!("reading {}", config.file.display()))?;

    let publisher = Publisher::new(&config.addr, secret.to_vec())?;
    let record = ContentRecord::new(config.title.as_str(), Utc::now(), body);

    publisher
        .publish(&config.name, &record)
        .await
        .with_context(|| format!("publishing to {}", config.addr))?;

    tracing::info!(name = %config.name, "new post pushed");
    Ok(())
}
