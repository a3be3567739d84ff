// Queue Domain Model

use super::meta::{ObjectMeta, Resource, TypeMeta};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API group of the arbitrator resources
pub const GROUP_NAME: &str = "arbitrator.incubator.k8s.io";

/// API version of the arbitrator resources
pub const VERSION: &str = "v1";

/// Resource name to quantity (e.g. `cpu` -> `2`, `memory` -> `4Gi`)
pub type ResourceList = BTreeMap<String, String>;

/// Desired share of a queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSpec {
    #[serde(default)]
    pub weight: i32,
}

/// Resources observed for a queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deserved: ResourceList,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub allocated: ResourceList,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub used: ResourceList,
}

/// Queue custom resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: QueueSpec,
    #[serde(default)]
    pub status: QueueStatus,
}

impl Queue {
    /// Create a queue with the given identity and weight
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, weight: i32) -> Self {
        Self {
            type_meta: TypeMeta {
                api_version: format!("{GROUP_NAME}/{VERSION}"),
                kind: "Queue".to_string(),
            },
            metadata: ObjectMeta::new(namespace, name),
            spec: QueueSpec { weight },
            status: QueueStatus::default(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

impl Resource for Queue {
    const GROUP: &'static str = GROUP_NAME;
    const RESOURCE: &'static str = "queue";

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }
}
