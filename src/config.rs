// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Run the NodeConfig controller
    pub node_controller: bool,
    /// Run the NamespaceConfig controller
    pub namespace_controller: bool,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_controller: true,
            namespace_controller: true,
            error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let node_controller = bool_var("FACTOTUM_NODE_CONTROLLER", true)?;
        let namespace_controller = bool_var("FACTOTUM_NAMESPACE_CONTROLLER", true)?;

        let error_requeue_secs = match env::var("FACTOTUM_ERROR_REQUEUE_SECS") {
            Ok(v) => v
                .parse()
                .context("FACTOTUM_ERROR_REQUEUE_SECS must be a number of seconds")?,
            Err(_) => DEFAULT_ERROR_REQUEUE_SECS,
        };

        Ok(Config {
            node_controller,
            namespace_controller,
            error_requeue: Duration::from_secs(error_requeue_secs),
        })
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{} must be 'true' or 'false', got '{}'", name, v)),
        Err(_) => Ok(default),
    }
}
