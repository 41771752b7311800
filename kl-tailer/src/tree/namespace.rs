use async_trait::async_trait;
use kl_core::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;
use crate::tree::workload::Workload;
use crate::watch::event_stream::EventStream;
use crate::watch::{
    ReconcileLevel,
    Reconciler,
};

// An interior node of the tree: one namespace, watching the workloads inside
// it.  The handle the cluster keeps only carries the scope; the
// reconciliation loop and its child map live in a spawned task that winds
// down when the stream does.
#[derive(Debug)]
pub(crate) struct Namespace {
    scope: CancellationToken,
}

impl Namespace {
    pub async fn spawn(
        ctx: Context,
        parent: &Identity,
        parent_scope: &CancellationToken,
        name: &str,
    ) -> anyhow::Result<Namespace> {
        let scope = parent_scope.child_token();
        let url = ctx.config.workloads_url(name);
        let stream = match EventStream::connect(&ctx.client, url, &scope).await {
            Ok(stream) => stream,
            Err(err) => {
                scope.cancel();
                return Err(err);
            },
        };

        let level = NamespaceLevel { ctx, identity: parent.clone(), scope: scope.clone() };
        let reconciler = Reconciler::new(level, stream);
        let loop_scope = scope.clone();
        let namespace = name.to_string();
        tokio::spawn(async move {
            reconciler.run().await;
            // Stream over: this namespace is done until the cluster sees a
            // fresh ADDED for its name
            debug!(namespace = %namespace, "workload watch ended");
            loop_scope.cancel();
        });

        Ok(Namespace { scope })
    }
}

impl Drop for Namespace {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

struct NamespaceLevel {
    ctx: Context,
    identity: Identity,
    scope: CancellationToken,
}

#[async_trait]
impl ReconcileLevel for NamespaceLevel {
    type Child = Workload;

    fn kind(&self) -> &'static str {
        WORKLOAD_KIND
    }

    async fn create(&self, obj: &ApiObject) -> anyhow::Result<Workload> {
        let mut workload = Workload::new(self.ctx.clone(), &self.identity, &self.scope, obj);
        workload.apply_status(&obj.status);
        Ok(workload)
    }

    async fn update(&self, child: &mut Workload, obj: &ApiObject) {
        child.apply_status(&obj.status);
    }
}

#[cfg(test)]
impl Namespace {
    pub(crate) fn scope(&self) -> &CancellationToken {
        &self.scope
    }
}
