// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::common::{CommonSpec, CommonStatus};
use super::Configuration;
use crate::sync::diff;
use crate::sync::handlers::Handler;
use crate::sync::selector::SelectorMap;
use k8s_openapi::api::core::v1::{Node, Taint};
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Labels, annotations and taints applied to every selected node
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "factotum.io", version = "v1alpha1", kind = "NodeConfig")]
#[kube(status = "NodeConfigStatus", shortname = "nc")]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigSpec {
    #[serde(flatten)]
    pub common: CommonSpec,
    /// Taints to apply; an empty effect removes the taint with that key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taints: Option<Vec<Taint>>,
    #[serde(default)]
    pub selector: NodeSelector,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeSelector {
    /// Node labels to select on; values are plain strings or regexes.
    /// Without a selector every node is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<SelectorMap>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfigStatus {
    #[serde(flatten)]
    pub common: CommonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_taints: Option<Vec<Taint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_selector: Option<NodeSelector>,
}

impl NodeConfig {
    fn desired_taints(&self) -> &[Taint] {
        self.spec.taints.as_deref().unwrap_or_default()
    }

    fn applied_taints(&self) -> &[Taint] {
        self.status
            .as_ref()
            .and_then(|s| s.applied_taints.as_deref())
            .unwrap_or_default()
    }

    fn record_attempt(&mut self) -> &mut NodeConfigStatus {
        let applied_taints = self
            .desired_taints()
            .iter()
            .filter(|t| !t.effect.is_empty())
            .cloned()
            .collect();
        let selector = self.spec.selector.clone();
        let common = self.spec.common.clone();

        let status = self.status.get_or_insert_with(NodeConfigStatus::default);
        status.common.record(&common);
        status.applied_taints = Some(applied_taints);
        status.applied_selector = Some(selector);
        status
    }
}

impl Configuration for NodeConfig {
    type Target = Node;

    fn common_spec(&self) -> &CommonSpec {
        &self.spec.common
    }

    fn common_status(&self) -> Option<&CommonStatus> {
        self.status.as_ref().map(|s| &s.common)
    }

    fn selector(&self) -> Option<&SelectorMap> {
        self.spec.selector.node_selector.as_ref()
    }

    fn handlers() -> Vec<Handler> {
        vec![Handler::Metadata, Handler::Taints]
    }

    fn cleanup(&mut self) {
        self.spec.common.clear();
        self.spec.taints = Some(Vec::new());
    }

    fn mark_applied(&mut self) {
        let name = self.name_any();
        let generation = self.metadata.generation;
        self.record_attempt().common.set_applied(
            true,
            "NodeConfigReady".to_string(),
            format!("{} applied", name),
            generation,
        );
    }

    fn mark_failed(&mut self, message: &str) {
        let name = self.name_any();
        let generation = self.metadata.generation;
        self.record_attempt().common.set_applied(
            false,
            "NodeConfigError".to_string(),
            format!("{} failed: {}", name, message),
            generation,
        );
    }

    fn status_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(&self.status)
    }

    fn taint_set(&self) -> Vec<Taint> {
        diff::taint_set(self.desired_taints(), self.applied_taints())
    }

    fn previous_selector(&self) -> Option<SelectorMap> {
        // Nothing was applied yet, so nothing can have left the selection
        let status = self.status.as_ref()?;
        let applied = status
            .applied_selector
            .as_ref()
            .and_then(|s| s.node_selector.clone())
            .unwrap_or_default();
        let desired = self.selector().cloned().unwrap_or_default();

        (applied != desired).then_some(applied)
    }
}
