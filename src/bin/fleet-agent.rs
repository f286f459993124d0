// Copyright (c) 2025 - Cowboy AI, Inc.
//! Fleet Agent
//!
//! Hosts one live server's configuration model and answers server-tier
//! update requests from the controller over NATS.
//!
//! Run with: cargo run --bin fleet-agent
//!
//! Environment:
//! 1. `FLEET_HOST` / `FLEET_SERVER`: this process's handle (required)
//! 2. `FLEET_SERVER_MODEL`: path to the server model document (required)
//! 3. `FLEET_NATS_URL`, `FLEET_CLIENT_NAME`, `FLEET_SUBJECT_PREFIX` as for
//!    the controller
//! 4. `FLEET_SAVE_ON_EXIT`: write the final model back to the document if set

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use cim_fleet_config::{
    document, ModelElement, NatsClient, ProcessHandle, PropagationConfig, ServerModel,
    ServerProcess, UpdateListener,
};

/// Settings specific to the agent
#[derive(Debug, Clone)]
struct AgentConfig {
    handle: ProcessHandle,
    model_path: PathBuf,
    save_on_exit: bool,
    propagation: PropagationConfig,
}

impl AgentConfig {
    fn from_env() -> Result<Self> {
        let host = std::env::var("FLEET_HOST").context("FLEET_HOST not set")?;
        let server = std::env::var("FLEET_SERVER").context("FLEET_SERVER not set")?;
        let model_path = std::env::var("FLEET_SERVER_MODEL")
            .context("FLEET_SERVER_MODEL not set")?
            .into();

        Ok(Self {
            handle: ProcessHandle::new(host, server),
            model_path,
            save_on_exit: std::env::var("FLEET_SAVE_ON_EXIT").is_ok(),
            propagation: PropagationConfig::from_env()?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = AgentConfig::from_env()?;
    info!(process = %config.handle, "Starting fleet agent");

    let model: ServerModel = document::load(&config.model_path).with_context(|| {
        format!("Failed to load server model from {}", config.model_path.display())
    })?;
    info!(server = model.name(), checksum = %model.checksum(), "Server model loaded");

    let process = Arc::new(ServerProcess::new(config.handle.clone(), model));

    let client = NatsClient::new(config.propagation.nats.clone())
        .await
        .context("Failed to connect to NATS")?;

    let listener = UpdateListener::new(
        client,
        Arc::clone(&process),
        &config.propagation.subject_prefix,
    );
    info!(subject = listener.subject(), "Listening for server updates");
    let task = listener.spawn().await?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
        _ = task => warn!("Update subscription ended"),
    }

    if config.save_on_exit {
        let model = process.snapshot().await;
        document::save(&model, &config.model_path)
            .with_context(|| format!("Failed to save {}", config.model_path.display()))?;
        info!(checksum = %model.checksum(), "Server model saved");
    }

    info!("Fleet agent stopped");
    Ok(())
}
