// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Result};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use factotum::config::Config;
use factotum::kubernetes::wait_for_crds;
use factotum::reconcilers;
use factotum::types::{NamespaceConfig, NodeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Factotum operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: node_controller={}, namespace_controller={}",
        config.node_controller, config.namespace_controller
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let mut kinds = Vec::new();
    let mut controllers: Vec<BoxFuture<'_, Result<()>>> = Vec::new();
    if config.node_controller {
        kinds.push("NodeConfig");
        controllers.push(reconcilers::run::<NodeConfig>(client.clone(), &config).boxed());
    }
    if config.namespace_controller {
        kinds.push("NamespaceConfig");
        controllers.push(reconcilers::run::<NamespaceConfig>(client.clone(), &config).boxed());
    }
    if controllers.is_empty() {
        bail!("No controllers enabled");
    }

    // Wait for our CRDs before starting reconcilers
    info!("Waiting for CRDs {:?} to become available...", kinds);
    wait_for_crds(&client, &kinds).await?;

    info!("Starting controllers...");
    try_join_all(controllers).await?;

    // This should never be reached as controllers run forever
    warn!("All controllers stopped unexpectedly");
    Ok(())
}
