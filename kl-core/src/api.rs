use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

// The slice of the orchestrator's wire format that the agent consumes.  A
// watch response body is a concatenation of Event values; everything the
// server sends that is not named here is dropped on the floor by serde, and
// anything missing falls back to its zero value.  The one exception is the
// event type itself: an event without a recognizable type is malformed and
// fails decoding.

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Added,
    Modified,
    Deleted,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectSpec {
    pub node_name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiObject {
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ObjectSpec,

    // Preserved verbatim; only the workload level knows how to pick container
    // statuses out of it.
    pub status: Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,

    #[serde(default)]
    pub object: ApiObject,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkloadStatus {
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContainerStatus {
    pub name: String,

    // Kubernetes spells this field "containerID"; accept the plain camelCase
    // form as well.
    #[serde(rename = "containerID", alias = "containerId")]
    pub container_id: String,
}

#[cfg(test)]
mod tests {
    use rstest::*;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::added("ADDED", EventType::Added)]
    #[case::modified("MODIFIED", EventType::Modified)]
    #[case::deleted("DELETED", EventType::Deleted)]
    fn test_decode_event_type(#[case] wire: &str, #[case] expected: EventType) {
        let evt: Event = serde_json::from_value(json!({
            "type": wire,
            "object": {"kind": "Namespace", "metadata": {"name": "n1"}},
        }))
        .unwrap();

        assert_eq!(evt.event_type, expected);
        assert_eq!(evt.object.kind, "Namespace");
        assert_eq!(evt.object.metadata.name, "n1");
    }

    #[rstest]
    fn test_decode_event_ignores_unknown_and_defaults_missing() {
        let evt: Event = serde_json::from_value(json!({
            "type": "MODIFIED",
            "object": {
                "kind": "Pod",
                "apiVersion": "v1",
                "metadata": {"name": "p1", "resourceVersion": "12345"},
                "spec": {"nodeName": "node-1", "restartPolicy": "Always"},
            },
        }))
        .unwrap();

        assert_eq!(evt.object.spec.node_name, "node-1");
        assert_eq!(evt.object.metadata.namespace, "");
        assert!(evt.object.metadata.labels.is_empty());
        assert!(evt.object.status.is_null());
    }

    #[rstest]
    #[case::bookmark(json!({"type": "BOOKMARK", "object": {}}))]
    #[case::missing_type(json!({"object": {"kind": "Pod"}}))]
    fn test_decode_event_rejects_unknown_type(#[case] body: serde_json::Value) {
        assert!(serde_json::from_value::<Event>(body).is_err());
    }

    #[rstest]
    #[case::kubernetes_casing("containerID")]
    #[case::camel_casing("containerId")]
    fn test_decode_container_status(#[case] id_key: &str) {
        let status: WorkloadStatus = serde_json::from_value(json!({
            "phase": "Running",
            "containerStatuses": [
                {"name": "main", id_key: "containerd://abc", "restartCount": 0},
                {"name": "sidecar"},
            ],
        }))
        .unwrap();

        assert_eq!(status.container_statuses.len(), 2);
        assert_eq!(status.container_statuses[0].container_id, "containerd://abc");
        assert_eq!(status.container_statuses[1].container_id, "");
    }
}
