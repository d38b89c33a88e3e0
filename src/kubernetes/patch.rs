// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Two-way strategic merge patches restricted to the managed fields.

use crate::types::{ManagedObject, MetadataMap};
use kube::ResourceExt;
use serde_json::{Map, Value};

/// Compute the strategic merge patch turning `original` into `modified`.
///
/// Only labels, annotations and taints are compared. Returns `None` when
/// they are identical, so callers can skip the API call entirely.
pub fn two_way_merge_patch<K: ManagedObject>(original: &K, modified: &K) -> Option<Value> {
    let mut metadata = Map::new();
    if let Some(labels) = diff_map(original.labels(), modified.labels()) {
        metadata.insert("labels".to_string(), labels);
    }
    if let Some(annotations) = diff_map(original.annotations(), modified.annotations()) {
        metadata.insert("annotations".to_string(), annotations);
    }

    let mut patch = Map::new();
    if !metadata.is_empty() {
        patch.insert("metadata".to_string(), Value::Object(metadata));
    }
    // Taint lists carry no merge key, so the whole list is replaced
    if original.taints() != modified.taints() {
        patch.insert(
            "spec".to_string(),
            serde_json::json!({ "taints": modified.taints() }),
        );
    }

    (!patch.is_empty()).then_some(Value::Object(patch))
}

fn diff_map(original: &MetadataMap, modified: &MetadataMap) -> Option<Value> {
    let mut diff = Map::new();

    for key in original.keys().filter(|k| !modified.contains_key(*k)) {
        diff.insert(key.clone(), Value::Null);
    }
    for (key, value) in modified {
        if original.get(key) != Some(value) {
            diff.insert(key.clone(), Value::String(value.clone()));
        }
    }

    (!diff.is_empty()).then_some(Value::Object(diff))
}
