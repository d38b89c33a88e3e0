// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Mutations a configuration applies to each selected object.

use crate::sync::diff;
use crate::types::{Configuration, ManagedObject};
use kube::ResourceExt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Labels and annotations
    Metadata,
    /// Node taints
    Taints,
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Metadata => "metadata",
            Handler::Taints => "taints",
        }
    }

    /// Mutate the target in place towards the configuration's desired state.
    /// Returns whether the target changed.
    pub fn apply<C: Configuration>(&self, target: &mut C::Target, config: &C) -> bool {
        let changed = match self {
            Handler::Metadata => apply_metadata(target, config),
            Handler::Taints => apply_taints(target, config),
        };

        trace!(
            "Handler {} on {} from {}: changed={}",
            self.name(),
            target.name_any(),
            config.name_any(),
            changed
        );
        changed
    }
}

fn apply_metadata<C: Configuration>(target: &mut C::Target, config: &C) -> bool {
    let mut changed = false;

    let annotations = diff::merge(target.annotations(), &config.annotation_set());
    if &annotations != target.annotations() {
        *target.annotations_mut() = annotations;
        changed = true;
    }

    let labels = diff::merge(target.labels(), &config.label_set());
    if &labels != target.labels() {
        *target.labels_mut() = labels;
        changed = true;
    }

    changed
}

fn apply_taints<C: Configuration>(target: &mut C::Target, config: &C) -> bool {
    let taints = config.taint_set();
    if taints.is_empty() {
        return false;
    }

    match target.taints_mut() {
        Some(current) => diff::update_taints(current, &taints),
        None => false,
    }
}
