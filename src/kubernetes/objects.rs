// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object creation utilities

use crate::error::{FactotumError, Result};
use crate::types::ManagedObject;
use kube::{api::PostParams, Api, ResourceExt};
use tracing::{debug, info, instrument};

/// Ensure an object exists in the cluster, creating it from the skeleton if
/// it doesn't. Returns the live object.
#[instrument(skip(api, skeleton), fields(name = %skeleton.name_any()))]
pub async fn ensure_object_exists<K: ManagedObject>(api: &Api<K>, skeleton: &K) -> Result<K> {
    let name = skeleton.name_any();

    match api.get(&name).await {
        Ok(existing) => {
            debug!("Object {} already exists", name);
            Ok(existing)
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            info!("Creating object {}", name);
            let created = api
                .create(&PostParams::default(), skeleton)
                .await
                .map_err(|e| FactotumError::CreateError(format!("Failed to create {}: {}", name, e)))?;
            info!("Object {} created successfully", name);
            Ok(created)
        }
        Err(e) => Err(FactotumError::CreateError(format!(
            "Failed to check/create {}: {}",
            name, e
        ))),
    }
}
