// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resources and the traits the sync engine is generic over.

pub mod common;
pub mod namespace_config;
pub mod node_config;
pub mod target;

pub use common::{CommonSpec, CommonStatus, Condition, MetadataMap};
pub use namespace_config::{ManagedNamespace, NamespaceConfig, NamespaceConfigSpec, NamespaceSelector};
pub use node_config::{NodeConfig, NodeConfigSpec, NodeSelector};
pub use target::ManagedObject;

use crate::sync::diff;
use crate::sync::handlers::Handler;
use crate::sync::selector::{Selector, SelectorMap};
use k8s_openapi::api::core::v1::Taint;
use kube::{Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A user-authored desired state for one kind of cluster object.
///
/// Read-style queries (`label_set`, `taint_set`, ...) never mutate the
/// configuration; they compute fresh values from spec and applied status.
pub trait Configuration:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The cluster object kind this configuration is applied to
    type Target: ManagedObject;

    fn common_spec(&self) -> &CommonSpec;

    fn common_status(&self) -> Option<&CommonStatus>;

    /// Label selector choosing targets; `None` selects everything
    fn selector(&self) -> Option<&SelectorMap>;

    /// Handlers run against every target, in order
    fn handlers() -> Vec<Handler>;

    /// Empty every desired field so an apply pass removes what was applied.
    fn cleanup(&mut self);

    /// Record a successful apply pass in the status.
    fn mark_applied(&mut self);

    /// Record a failed apply pass in the status.
    fn mark_failed(&mut self, message: &str);

    /// Serialized status, for persisting through the status subresource
    fn status_value(&self) -> serde_json::Result<serde_json::Value>;

    /// The selector with its patterns compiled, for sweeps over many objects
    fn compiled_selector(&self) -> Selector {
        Selector::new(self.selector())
    }

    fn matches(&self, target: &Self::Target) -> bool {
        self.compiled_selector().matches(target.labels())
    }

    /// Desired labels plus removal markers for labels applied earlier
    fn label_set(&self) -> MetadataMap {
        diff::with_tombstones(
            self.common_spec().labels.as_ref(),
            self.common_status().and_then(|s| s.applied_labels.as_ref()),
        )
    }

    /// Desired annotations plus removal markers for annotations applied earlier
    fn annotation_set(&self) -> MetadataMap {
        diff::with_tombstones(
            self.common_spec().annotations.as_ref(),
            self.common_status()
                .and_then(|s| s.applied_annotations.as_ref()),
        )
    }

    fn taint_set(&self) -> Vec<Taint> {
        Vec::new()
    }

    /// The previously applied selector, if it differs from the desired one.
    fn previous_selector(&self) -> Option<SelectorMap> {
        None
    }

    /// Objects that must exist before the configuration is applied.
    fn requested_objects(&self) -> Vec<Self::Target> {
        Vec::new()
    }

    /// Names of objects targeted regardless of the selector, including
    /// while the configuration is being deleted.
    fn named_objects(&self) -> Vec<String> {
        Vec::new()
    }
}
