use std::collections::{
    BTreeMap,
    HashMap,
};

use kl_core::api::WorkloadStatus;
use kl_core::prelude::*;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;
use crate::tree::container::Container;

// One workload and the containers currently running inside it.  Workloads
// have no stream of their own; the namespace loop feeds them status
// snapshots pulled out of the workload's watch events.
pub(crate) struct Workload {
    ctx: Context,
    identity: Identity,
    scope: CancellationToken,
    containers: HashMap<String, Container>,
}

impl Workload {
    pub fn new(ctx: Context, parent: &Identity, parent_scope: &CancellationToken, obj: &ApiObject) -> Workload {
        let scope = parent_scope.child_token();
        let labels = if ctx.config.merge_labels {
            obj.metadata.labels.clone()
        } else {
            BTreeMap::new()
        };
        let decode_field = if ctx.config.decode {
            decode_field_for(&obj.metadata.annotations)
        } else {
            None
        };
        let identity = parent.with_workload(
            &obj.metadata.namespace,
            &obj.metadata.name,
            &obj.spec.node_name,
            labels,
            decode_field,
        );

        Workload { ctx, identity, scope, containers: HashMap::new() }
    }

    // Applies one status snapshot to the container map.  The snapshot is
    // authoritative only for the names it mentions: a name missing from the
    // list keeps its child until the workload itself goes away.
    pub fn apply_status(&mut self, status: &Value) {
        if status.is_null() {
            return;
        }

        let status: WorkloadStatus = match serde_json::from_value(status.clone()) {
            Ok(status) => status,
            Err(err) => {
                error!(workload = %self.identity.workload, error = %err, "could not decode workload status");
                return;
            },
        };

        for entry in status.container_statuses {
            if entry.container_id.is_empty() {
                // No longer scheduled on a runtime
                if self.containers.remove(&entry.name).is_some() {
                    debug!(container_name = %entry.name, "container ended");
                }
                continue;
            }

            if let Some(current) = self.containers.get(&entry.name) {
                if current.id() == entry.container_id {
                    continue;
                }
                // Same name, new id: the old instance is gone
                self.containers.remove(&entry.name);
                debug!(container_name = %entry.name, "container replaced");
            }

            let container = Container::spawn(&self.ctx, &self.identity, &self.scope, &entry.name, &entry.container_id);
            self.containers.insert(entry.name, container);
        }
    }
}

impl Drop for Workload {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

fn decode_field_for(annotations: &BTreeMap<String, String>) -> Option<String> {
    if annotations.get(LOG_FORMAT_ANNOTATION_KEY).map(String::as_str) != Some(LOG_FORMAT_JSON) {
        return None;
    }

    match annotations.get(MESSAGE_FIELD_ANNOTATION_KEY) {
        Some(field) if !field.is_empty() => Some(field.clone()),
        _ => Some(DEFAULT_MESSAGE_FIELD.into()),
    }
}

#[cfg(test)]
impl Workload {
    pub(crate) fn identity(&self) -> &Identity {
        &self.identity
    }

    pub(crate) fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    pub(crate) fn container(&self, name: &str) -> Option<&Container> {
        self.containers.get(name)
    }

    pub(crate) fn container_count(&self) -> usize {
        self.containers.len()
    }
}
