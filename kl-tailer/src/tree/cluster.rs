use async_trait::async_trait;
use kl_core::errors::*;
use kl_core::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;
use crate::tree::namespace::Namespace;
use crate::watch::event_stream::EventStream;
use crate::watch::{
    ReconcileLevel,
    Reconciler,
};

// Root of the tree.  Structurally the same loop as a namespace, one level
// up, except that it owns the process-wide scope and that its stream ending
// is not something a parent can recover from.
#[derive(Debug)]
pub(crate) struct Cluster {
    scope: CancellationToken,
    reconciler: Reconciler<ClusterLevel>,
}

impl Cluster {
    // Failure to open the root stream is fatal; there is no level above the
    // cluster to try again later.
    pub async fn new(ctx: Context, scope: CancellationToken) -> anyhow::Result<Cluster> {
        let stream = EventStream::connect(&ctx.client, ctx.config.namespaces_url(), &scope).await?;
        let identity = Identity::for_cluster(&ctx.config.cluster_name);
        let level = ClusterLevel { ctx, identity, scope: scope.clone() };
        Ok(Cluster { scope, reconciler: Reconciler::new(level, stream) })
    }

    // Runs until the root stream terminates.  Termination is graceful only
    // when the root scope was cancelled first (shutdown); the namespace feed
    // ending on the server side is fatal, and reopening it is left to the
    // supervisor that restarts the process.
    pub async fn run(self) -> EmptyResult {
        self.reconciler.run().await;

        let graceful = self.scope.is_cancelled();
        self.scope.cancel();
        if graceful {
            info!("shut down cleanly");
            Ok(())
        } else {
            Err(AgentError::upstream_disconnected())
        }
    }
}

struct ClusterLevel {
    ctx: Context,
    identity: Identity,
    scope: CancellationToken,
}

#[async_trait]
impl ReconcileLevel for ClusterLevel {
    type Child = Namespace;

    fn kind(&self) -> &'static str {
        NAMESPACE_KIND
    }

    async fn create(&self, obj: &ApiObject) -> anyhow::Result<Namespace> {
        Namespace::spawn(self.ctx.clone(), &self.identity, &self.scope, &obj.metadata.name).await
    }

    async fn update(&self, _child: &mut Namespace, obj: &ApiObject) {
        // Nothing in a namespace object feeds the tree; the workloads inside
        // it have their own watch
        debug!(namespace = %obj.metadata.name, "namespace modified");
    }
}
