// Copyright (c) 2025 - Cowboy AI, Inc.
//! Saga Inspector
//!
//! Lists sagas from the configured event store and prints their state.
//!
//! Run with: cargo run --bin saga-inspect
//!
//! The inspector reads a persistent store, so `SAGA_STORE_BACKEND` must be
//! `nats`; an in-memory store started by this process would always be empty.
//!
//! Configuration comes from the usual store variables (`SAGA_STORE_BACKEND`,
//! `NATS_URL`, `NATS_STREAM`, `SAGA_SUBJECT_PREFIX`) plus:
//! - `SAGA_NAMES`: comma-separated saga names to include (default: all)
//! - `SAGA_RUNNING`: `true` for running sagas only, `false` for complete only

use anyhow::{bail, Context, Result};
use cim_saga::{
    config::Backend, EventRepository, ListCriteria, NatsEventRepository, Saga, SagaRepository,
    SagaStoreConfig,
};
use std::sync::Arc;
use tracing::info;

/// Build the saga filter from `SAGA_NAMES` and `SAGA_RUNNING`
fn criteria_from_env() -> Result<ListCriteria> {
    let names = std::env::var("SAGA_NAMES").ok().map(|names| {
        names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
    });

    let running = std::env::var("SAGA_RUNNING")
        .ok()
        .map(|value| value.trim().parse::<bool>())
        .transpose()
        .context("SAGA_RUNNING must be 'true' or 'false'")?;

    Ok(ListCriteria { names, running })
}

fn status(saga: &Saga) -> &'static str {
    match saga.is_success() {
        Some(true) => "succeeded",
        Some(false) => "failed",
        None if saga.is_compensating() => "compensating",
        None => "running",
    }
}

/// Open the configured store; only a persistent backend has sagas to show
async fn connect(config: &SagaStoreConfig) -> Result<Arc<dyn EventRepository>> {
    match config.backend {
        Backend::Memory => bail!(
            "saga-inspect needs a persistent store: set SAGA_STORE_BACKEND=nats \
             (an in-memory store opened here would always be empty)"
        ),
        Backend::Nats => {
            info!("🔌 Connecting to NATS at {:?}", config.nats.servers);
            let repository =
                NatsEventRepository::connect_with_config(&config.nats, config.jetstream.clone())
                    .await
                    .context("Failed to connect to NATS")?;
            info!("✅ Connected, stream: {}", config.jetstream.stream_name);
            let repository: Arc<dyn EventRepository> = Arc::new(repository);
            Ok(repository)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("🚀 Starting saga inspector");

    let config = SagaStoreConfig::from_env().context("Invalid saga store configuration")?;
    let criteria = criteria_from_env()?;
    info!("📋 Configuration loaded:");
    info!("  - Backend: {:?}", config.backend);
    info!("  - Names: {:?}", criteria.names);
    info!("  - Running: {:?}", criteria.running);

    let events = connect(&config).await?;

    let sagas = SagaRepository::new(events)
        .list(&criteria)
        .await
        .context("Failed to list sagas")?;

    println!(
        "{:<24} {:<40} {:>8} {:>8} {:<12} OUTSTANDING",
        "NAME", "ID", "VERSION", "EVENTS", "STATUS"
    );
    for saga in &sagas {
        let outstanding: Vec<&str> = saga
            .outstanding_commands()
            .iter()
            .map(|command| command.name.as_str())
            .collect();

        println!(
            "{:<24} {:<40} {:>8} {:>8} {:<12} {}",
            saga.name(),
            saga.id(),
            saga.version(),
            saga.events().len(),
            status(saga),
            outstanding.join(",")
        );
    }

    info!("✅ Listed {} saga(s)", sagas.len());
    Ok(())
}
