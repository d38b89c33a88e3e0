// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Set differences between desired and applied metadata and taints.
//!
//! Removal is always explicit: an empty label/annotation value or an empty
//! taint effect (a tombstone) removes the key. Keys that are simply absent
//! from the desired set are left alone.

use crate::types::MetadataMap;
use k8s_openapi::api::core::v1::Taint;

/// Merge a desired map into the current one and return the result.
pub fn merge(current: &MetadataMap, desired: &MetadataMap) -> MetadataMap {
    let mut merged = current.clone();

    for (key, value) in desired {
        if value.is_empty() {
            merged.remove(key);
        } else if merged.get(key) != Some(value) {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
}

/// Desired map plus a tombstone for every applied key no longer desired.
pub fn with_tombstones(desired: Option<&MetadataMap>, applied: Option<&MetadataMap>) -> MetadataMap {
    let mut set = desired.cloned().unwrap_or_default();

    for key in applied.into_iter().flat_map(|a| a.keys()) {
        if !set.contains_key(key) {
            set.insert(key.clone(), String::new());
        }
    }

    set
}

/// Desired taints plus a tombstone for every applied taint key no longer desired.
pub fn taint_set(desired: &[Taint], applied: &[Taint]) -> Vec<Taint> {
    let mut set = desired.to_vec();

    for taint in applied {
        if !desired.iter().any(|t| t.key == taint.key) {
            set.push(tombstone(&taint.key));
        }
    }

    set
}

fn tombstone(key: &str) -> Taint {
    Taint {
        key: key.to_string(),
        effect: String::new(),
        value: None,
        time_added: None,
    }
}

/// Two taints are the same when key, value and effect agree; the time a
/// taint was added is owned by the cluster.
fn same_taint(a: &Taint, b: &Taint) -> bool {
    a.key == b.key && a.value == b.value && a.effect == b.effect
}

/// Converge a taint list towards the desired taints. Returns whether
/// anything changed.
pub fn update_taints(current: &mut Vec<Taint>, desired: &[Taint]) -> bool {
    let mut changed = false;

    for taint in desired {
        match current.iter().position(|t| t.key == taint.key) {
            // Removing a taint the object never had
            None if taint.effect.is_empty() => {}
            None => {
                current.push(taint.clone());
                changed = true;
            }
            Some(index) if same_taint(&current[index], taint) => {}
            Some(index) if taint.effect.is_empty() => {
                current.remove(index);
                changed = true;
            }
            Some(index) => {
                current[index] = taint.clone();
                changed = true;
            }
        }
    }

    changed
}
