use kl_core::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;
use crate::tree::log_stream;

// Leaf of the tree.  One container identity owns one log stream for its
// whole life; an id change upstream is modeled as dropping this node and
// creating a fresh one, never as mutating the id in place.
pub(crate) struct Container {
    id: String,
    scope: CancellationToken,
}

impl Container {
    pub fn spawn(
        ctx: &Context,
        parent: &Identity,
        parent_scope: &CancellationToken,
        name: &str,
        id: &str,
    ) -> Container {
        let scope = parent_scope.child_token();
        let identity = parent.with_container(name, id);
        debug!(container_name = name, container_id = id, "tailing container");
        tokio::spawn(log_stream::run(ctx.clone(), identity, scope.clone()));
        Container { id: id.into(), scope }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

#[cfg(test)]
impl Container {
    pub(crate) fn scope(&self) -> &CancellationToken {
        &self.scope
    }
}
