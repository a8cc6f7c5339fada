// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use openbao_unsealer::config::Config;
use openbao_unsealer::reconcilers::UnsealReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting OpenBao unseal operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: secret={}/{}, exec_timeout={:?}",
        config.secret_name, config.secret_key, config.exec_timeout
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    UnsealReconciler::new(client, config).run().await?;

    info!("Shut down cleanly");
    Ok(())
}
