mod context;
mod tree;
mod watch;

use std::sync::Arc;

use clap::{
    ArgAction,
    Parser,
};
use kl_core::emitter::{
    JsonEmitter,
    TextEmitter,
};
use kl_core::logging;
use kl_core::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;
use crate::tree::Cluster;

#[derive(Debug, Parser)]
#[command(about = "Tails every container in the cluster and re-emits its log lines as structured records")]
struct Options {
    /// Base URL of the orchestrator API
    #[arg(long, default_value = "http://127.0.0.1:8001/")]
    url: String,

    /// Cluster name, attached to every record
    #[arg(long, default_value = "default")]
    cluster: String,

    /// Only request log lines newer than this many seconds; negative disables the filter
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    since: i64,

    /// Decode JSON-formatted messages for annotated workloads
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    decode: bool,

    /// Merge workload labels into every record
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    labels: bool,

    /// Emit records and diagnostics as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

fn build_config(args: &Options) -> anyhow::Result<Config> {
    let mut config = Config::new(&args.url, &args.cluster)?;
    config.since_seconds = u64::try_from(args.since).ok();
    config.decode = args.decode;
    config.merge_labels = args.labels;
    Ok(config)
}

async fn run(args: Options) -> EmptyResult {
    let config = build_config(&args)?;
    let emitter: SharedEmitter = if args.json {
        Arc::new(JsonEmitter::stdout())
    } else {
        Arc::new(TextEmitter::stdout())
    };
    let ctx = Context {
        client: reqwest::Client::new(),
        config: Arc::new(config),
        emitter,
    };

    let root = CancellationToken::new();
    let cluster = Cluster::new(ctx, root.clone()).await?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received interrupt, shutting down");
            root.cancel();
        }
    });

    cluster.run().await
}

#[tokio::main]
async fn main() -> EmptyResult {
    let args = Options::parse();
    logging::setup(&args.verbosity, args.json);
    run(args).await
}

#[cfg(test)]
mod tests;
