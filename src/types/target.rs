// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster objects whose metadata the sync engine manages.

use super::MetadataMap;
use k8s_openapi::api::core::v1::{Namespace, Node, NodeSpec, Taint};
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

pub trait ManagedObject:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// A bare object with only a name, labels and annotations, for creation
    fn skeleton(name: &str, labels: MetadataMap, annotations: MetadataMap) -> Self;

    fn taints(&self) -> &[Taint] {
        &[]
    }

    /// Mutable taint list, or `None` when the kind carries no taints
    fn taints_mut(&mut self) -> Option<&mut Vec<Taint>> {
        None
    }

    /// Compare only the fields the engine manages; everything else is ignored.
    fn same_managed_fields(&self, other: &Self) -> bool {
        self.labels() == other.labels()
            && self.annotations() == other.annotations()
            && self.taints() == other.taints()
    }
}

fn skeleton_meta(name: &str, labels: MetadataMap, annotations: MetadataMap) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        labels: (!labels.is_empty()).then_some(labels),
        annotations: (!annotations.is_empty()).then_some(annotations),
        ..Default::default()
    }
}

impl ManagedObject for Node {
    fn skeleton(name: &str, labels: MetadataMap, annotations: MetadataMap) -> Self {
        Node {
            metadata: skeleton_meta(name, labels, annotations),
            ..Default::default()
        }
    }

    fn taints(&self) -> &[Taint] {
        self.spec
            .as_ref()
            .and_then(|s| s.taints.as_deref())
            .unwrap_or_default()
    }

    fn taints_mut(&mut self) -> Option<&mut Vec<Taint>> {
        Some(
            self.spec
                .get_or_insert_with(NodeSpec::default)
                .taints
                .get_or_insert_with(Vec::new),
        )
    }
}

impl ManagedObject for Namespace {
    fn skeleton(name: &str, labels: MetadataMap, annotations: MetadataMap) -> Self {
        Namespace {
            metadata: skeleton_meta(name, labels, annotations),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::NodeStatus;

    fn make_node(labels: &[(&str, &str)], taints: Vec<Taint>) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("node1".to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints: Some(taints),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn taint(key: &str, value: &str) -> Taint {
        Taint {
            key: key.to_string(),
            value: Some(value.to_string()),
            effect: "NoSchedule".to_string(),
            time_added: None,
        }
    }

    #[test]
    fn test_nodes_are_equal() {
        let a = make_node(&[("label1", "value1")], vec![taint("key1", "value1")]);
        let b = a.clone();
        assert!(a.same_managed_fields(&b));
    }

    #[test]
    fn test_nodes_have_different_labels() {
        let a = make_node(&[("label1", "value1")], vec![]);
        let b = make_node(&[("label1", "value2")], vec![]);
        assert!(!a.same_managed_fields(&b));
    }

    #[test]
    fn test_nodes_have_different_annotations() {
        let a = make_node(&[], vec![]);
        let mut b = a.clone();
        b.annotations_mut()
            .insert("key1".to_string(), "value1".to_string());
        assert!(!a.same_managed_fields(&b));
    }

    #[test]
    fn test_nodes_have_different_taints() {
        let a = make_node(&[], vec![taint("key1", "value1")]);
        let b = make_node(&[], vec![taint("key1", "value2")]);
        assert!(!a.same_managed_fields(&b));
    }

    #[test]
    fn test_unmanaged_fields_are_ignored() {
        let a = make_node(&[("label1", "value1")], vec![]);
        let mut b = a.clone();
        b.metadata.resource_version = Some("42".to_string());
        b.status = Some(NodeStatus::default());
        assert!(a.same_managed_fields(&b));
    }

    #[test]
    fn test_namespace_has_no_taints() {
        let mut ns = Namespace::skeleton("team-a", MetadataMap::new(), MetadataMap::new());
        assert!(ns.taints().is_empty());
        assert!(ns.taints_mut().is_none());
        assert_eq!(ns.name_any(), "team-a");
        assert!(ns.metadata.labels.is_none());
    }
}
