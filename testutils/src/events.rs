use kl_core::api::Event;
use serde_json::{
    Value,
    json,
};

use crate::constants::*;

// Wire-shaped watch event fixtures.  These are deliberately built as raw JSON
// values rather than typed Events so that tests exercise the same decoding
// path the agent uses in production.

pub fn namespace_event(event_type: &str, name: &str) -> Value {
    json!({
        "type": event_type,
        "object": {"kind": "Namespace", "metadata": {"name": name}},
    })
}

pub fn workload_event(event_type: &str, name: &str, statuses: &[(&str, &str)]) -> Value {
    let container_statuses: Vec<Value> = statuses
        .iter()
        .map(|(name, id)| json!({"name": name, "containerID": id}))
        .collect();

    json!({
        "type": event_type,
        "object": {
            "kind": "Pod",
            "metadata": {
                "name": name,
                "namespace": TEST_NAMESPACE,
                "labels": {"app": "nginx"},
            },
            "spec": {"nodeName": TEST_NODE},
            "status": {"containerStatuses": container_statuses},
        },
    })
}

pub fn with_annotations(mut event: Value, annotations: &[(&str, &str)]) -> Value {
    let map: serde_json::Map<String, Value> =
        annotations.iter().map(|(key, value)| ((*key).into(), json!(value))).collect();
    event["object"]["metadata"]["annotations"] = Value::Object(map);
    event
}

pub fn event_from(value: &Value) -> Event {
    serde_json::from_value(value.clone()).unwrap()
}

// Concatenates events without any delimiter, the way the server streams them
pub fn watch_body(events: &[Value]) -> String {
    events.iter().map(|event| event.to_string()).collect()
}
