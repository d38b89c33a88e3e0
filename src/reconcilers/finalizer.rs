// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Finalizer bookkeeping on configurations.

use crate::constants::FINALIZER;
use crate::error::{FactotumError, Result};
use kube::api::{ObjectMeta, Patch, PatchParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt::Debug;
use tracing::{debug, instrument};

pub fn has_finalizer(meta: &ObjectMeta) -> bool {
    meta.finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|name| name == FINALIZER))
}

/// The finalizer list with ours appended if it was missing.
pub fn with_finalizer(finalizers: &[String]) -> Vec<String> {
    let mut updated = finalizers.to_vec();
    if !updated.iter().any(|name| name == FINALIZER) {
        updated.push(FINALIZER.to_string());
    }
    updated
}

/// The finalizer list with every occurrence of ours removed.
pub fn without_finalizer(finalizers: &[String]) -> Vec<String> {
    finalizers
        .iter()
        .filter(|name| *name != FINALIZER)
        .cloned()
        .collect()
}

#[instrument(skip(api, obj), fields(name = %obj.name_any()))]
pub async fn add_finalizer<K>(api: &Api<K>, obj: &K) -> Result<K>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    debug!("Adding finalizer {}", FINALIZER);
    patch_finalizers(api, obj, with_finalizer(obj.finalizers())).await
}

#[instrument(skip(api, obj), fields(name = %obj.name_any()))]
pub async fn remove_finalizer<K>(api: &Api<K>, obj: &K) -> Result<K>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    debug!("Removing finalizer {}", FINALIZER);
    patch_finalizers(api, obj, without_finalizer(obj.finalizers())).await
}

/// Merge patch of the finalizer list, guarded by the resource version when known.
async fn patch_finalizers<K>(api: &Api<K>, obj: &K, finalizers: Vec<String>) -> Result<K>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let mut metadata = json!({ "finalizers": finalizers });
    if let Some(version) = obj.resource_version() {
        metadata["resourceVersion"] = Value::String(version);
    }

    let name = obj.name_any();
    api.patch(
        &name,
        &PatchParams::default(),
        &Patch::Merge(json!({ "metadata": metadata })),
    )
    .await
    .map_err(|e| FactotumError::FinalizerError(format!("{}: {}", name, e)))
}
