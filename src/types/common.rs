// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Spec and status fields shared by every configuration kind.

use crate::constants::conditions;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label or annotation map; an empty value marks the key for removal
pub type MetadataMap = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonSpec {
    /// Annotations to apply to selected objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<MetadataMap>,
    /// Labels to apply to selected objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<MetadataMap>,
}

impl CommonSpec {
    /// Empty the desired labels and annotations. Applying the result removes
    /// everything that was applied before.
    pub fn clear(&mut self) {
        self.labels = Some(MetadataMap::new());
        self.annotations = Some(MetadataMap::new());
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommonStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Labels applied to the selected objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_labels: Option<MetadataMap>,
    /// Annotations applied to the selected objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_annotations: Option<MetadataMap>,
}

impl CommonStatus {
    /// Record the desired metadata as applied, dropping removal markers.
    pub fn record(&mut self, spec: &CommonSpec) {
        self.applied_labels = Some(without_removals(spec.labels.as_ref()));
        self.applied_annotations = Some(without_removals(spec.annotations.as_ref()));
    }

    pub fn applied_condition(&self) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == conditions::APPLIED)
    }

    /// Replace the Applied condition. The transition time is kept when the
    /// condition status does not change.
    pub fn set_applied(
        &mut self,
        applied: bool,
        reason: String,
        message: String,
        observed_generation: Option<i64>,
    ) {
        let status = if applied {
            conditions::TRUE
        } else {
            conditions::FALSE
        };

        let last_transition_time = match self.applied_condition() {
            Some(previous) if previous.status == status => previous.last_transition_time.clone(),
            _ => Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        };

        self.conditions = vec![Condition {
            condition_type: conditions::APPLIED.to_string(),
            status: status.to_string(),
            reason: Some(reason),
            message: Some(message),
            last_transition_time,
            observed_generation,
        }];
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

fn without_removals(map: Option<&MetadataMap>) -> MetadataMap {
    map.map(|m| {
        m.iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
    .unwrap_or_default()
}
