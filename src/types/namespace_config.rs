// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::common::{CommonSpec, CommonStatus, MetadataMap};
use super::{Configuration, ManagedObject};
use crate::sync::handlers::Handler;
use crate::sync::selector::SelectorMap;
use k8s_openapi::api::core::v1::Namespace;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Labels and annotations applied to every selected namespace, plus
/// namespaces created on demand
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "factotum.io", version = "v1alpha1", kind = "NamespaceConfig")]
#[kube(status = "NamespaceConfigStatus", shortname = "nsc")]
#[serde(rename_all = "camelCase")]
pub struct NamespaceConfigSpec {
    #[serde(flatten)]
    pub common: CommonSpec,
    #[serde(default)]
    pub selector: NamespaceSelector,
    /// Namespaces to create if they do not exist yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<ManagedNamespace>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<SelectorMap>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedNamespace {
    pub name: String,
    /// Extra labels for this namespace only, set at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<MetadataMap>,
    /// Extra annotations for this namespace only, set at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<MetadataMap>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceConfigStatus {
    #[serde(flatten)]
    pub common: CommonStatus,
}

impl NamespaceConfig {
    fn record_attempt(&mut self) -> &mut CommonStatus {
        let common = self.spec.common.clone();
        let status = self.status.get_or_insert_with(NamespaceConfigStatus::default);
        status.common.record(&common);
        &mut status.common
    }
}

/// Merge base and overlay metadata for a new object, skipping removal markers
fn creation_metadata(base: Option<&MetadataMap>, overlay: Option<&MetadataMap>) -> MetadataMap {
    base.into_iter()
        .chain(overlay)
        .flatten()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl Configuration for NamespaceConfig {
    type Target = Namespace;

    fn common_spec(&self) -> &CommonSpec {
        &self.spec.common
    }

    fn common_status(&self) -> Option<&CommonStatus> {
        self.status.as_ref().map(|s| &s.common)
    }

    fn selector(&self) -> Option<&SelectorMap> {
        self.spec.selector.namespace_selector.as_ref()
    }

    fn handlers() -> Vec<Handler> {
        vec![Handler::Metadata]
    }

    fn cleanup(&mut self) {
        self.spec.common.clear();
    }

    fn mark_applied(&mut self) {
        let name = self.name_any();
        let generation = self.metadata.generation;
        self.record_attempt().set_applied(
            true,
            "NamespaceConfigReady".to_string(),
            format!("{} applied", name),
            generation,
        );
    }

    fn mark_failed(&mut self, message: &str) {
        let name = self.name_any();
        let generation = self.metadata.generation;
        self.record_attempt().set_applied(
            false,
            "NamespaceConfigError".to_string(),
            format!("{} failed: {}", name, message),
            generation,
        );
    }

    fn status_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.status)
    }

    fn named_objects(&self) -> Vec<String> {
        self.spec
            .namespaces
            .iter()
            .flatten()
            .map(|ns| ns.name.clone())
            .collect()
    }

    fn requested_objects(&self) -> Vec<Namespace> {
        // A configuration on its way out never brings namespaces back
        if self.metadata.deletion_timestamp.is_some() {
            return Vec::new();
        }

        self.spec
            .namespaces
            .iter()
            .flatten()
            .map(|ns| {
                Namespace::skeleton(
                    &ns.name,
                    creation_metadata(self.spec.common.labels.as_ref(), ns.labels.as_ref()),
                    creation_metadata(
                        self.spec.common.annotations.as_ref(),
                        ns.annotations.as_ref(),
                    ),
                )
            })
            .collect()
    }
}
