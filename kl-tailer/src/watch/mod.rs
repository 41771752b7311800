pub mod event_stream;

use std::collections::HashMap;

use async_trait::async_trait;
use kl_core::prelude::*;
use tracing::*;

use self::event_stream::EventStream;

// One level of the watch tree, seen from its reconciliation loop: the kind of
// object it watches, how to build a child from an ADDED event, and how to
// apply a MODIFIED event to an existing child.  Teardown is not part of the
// interface; removing a child from the map drops it, and each child type
// cancels its own scope on drop.
#[cfg_attr(test, automock(type Child = tests::TestChild;))]
#[async_trait]
pub(crate) trait ReconcileLevel {
    type Child: Send;

    fn kind(&self) -> &'static str;
    async fn create(&self, obj: &ApiObject) -> anyhow::Result<Self::Child>;
    async fn update(&self, child: &mut Self::Child, obj: &ApiObject);
}

// Converges a keyed map of live children onto the events arriving from one
// watch stream.  The child map is only ever touched from this loop, so the
// levels never need locks around their children.
pub(crate) struct Reconciler<L: ReconcileLevel> {
    level: L,
    stream: EventStream,
    children: HashMap<String, L::Child>,
}

impl<L: ReconcileLevel> std::fmt::Debug for Reconciler<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").field("children", &self.children.len()).finish()
    }
}

impl<L: ReconcileLevel> Reconciler<L> {
    pub fn new(level: L, stream: EventStream) -> Reconciler<L> {
        Reconciler { level, stream, children: HashMap::new() }
    }

    // Consumes the stream until it terminates.  Dropping the reconciler is
    // what actually tears the subtree down; the caller decides what stream
    // termination means at its own level.
    pub async fn run(mut self) {
        while let Some(evt) = self.stream.next().await {
            self.handle_event(evt).await;
        }
    }

    pub(crate) async fn handle_event(&mut self, evt: Event) {
        let obj = evt.object;
        if obj.kind != self.level.kind() {
            warn!(
                kind = %obj.kind,
                expected = self.level.kind(),
                "dropping event for unexpected object kind"
            );
            return;
        }

        let name = obj.metadata.name.clone();
        match evt.event_type {
            EventType::Added => {
                // A second ADDED for a live child is a recoverable anomaly;
                // the old subtree is cancelled and a fresh one installed
                if self.children.remove(&name).is_some() {
                    warn!(kind = self.level.kind(), name = %name, "got ADDED event for already-known child, replacing it");
                }
                match self.level.create(&obj).await {
                    Ok(child) => {
                        debug!(kind = self.level.kind(), name = %name, "added child");
                        self.children.insert(name, child);
                    },
                    Err(err) => {
                        warn!(kind = self.level.kind(), name = %name, error = format!("{err:#}"), "could not create child");
                    },
                }
            },
            EventType::Modified => match self.children.get_mut(&name) {
                Some(child) => {
                    self.level.update(child, &obj).await;
                    debug!(kind = self.level.kind(), name = %name, "modified child");
                },
                None => warn!(kind = self.level.kind(), name = %name, "got MODIFIED event for unknown child"),
            },
            EventType::Deleted => {
                if self.children.remove(&name).is_none() {
                    warn!(kind = self.level.kind(), name = %name, "got DELETED event for unknown child");
                } else {
                    debug!(kind = self.level.kind(), name = %name, "deleted child");
                }
            },
        }
    }
}

#[cfg(test)]
use mockall::automock;

#[cfg(test)]
mod tests;

#[cfg(test)]
impl<L: ReconcileLevel> Reconciler<L> {
    pub(crate) fn child(&self, name: &str) -> Option<&L::Child> {
        self.children.get(name)
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }
}
