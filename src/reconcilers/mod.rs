// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to configuration events.

pub mod configuration;
pub mod finalizer;

pub use configuration::ConfigReconciler;

use crate::config::Config;
use crate::sync::SyncManager;
use crate::types::Configuration;
use kube::{Client, Resource};
use tracing::info;

/// Run the object watcher, sync manager and reconciler for one configuration kind.
pub async fn run<C: Configuration>(client: Client, config: &Config) -> anyhow::Result<()> {
    let (sync_manager, sync_handle) = SyncManager::<C>::new(client.clone());
    let watcher = sync_manager.watcher();
    let reconciler = ConfigReconciler::new(client, sync_handle, config);

    info!("Starting {} controller", C::kind(&()));

    tokio::try_join!(watcher.run(), sync_manager.run(), reconciler.run())?;
    Ok(())
}
