use std::io;
use std::time::Duration;

use futures::TryStreamExt;
use kl_core::prelude::*;
use serde_json::{
    Map,
    Value,
};
use tokio::io::AsyncBufReadExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::context::Context;

enum TailOutcome {
    Done,
    Retry,
}

// Tails one container's log endpoint for as long as the container lives.
// EOF and a rejected request end the tail for good (the workload spawns a
// replacement when the orchestrator reports a new container id); a mid-body
// read error reconnects after a short pause, still under the same scope.
pub(crate) async fn run(ctx: Context, identity: Identity, scope: CancellationToken) {
    loop {
        match tail_once(&ctx, &identity, &scope).await {
            TailOutcome::Done => break,
            TailOutcome::Retry => {
                tokio::select! {
                    _ = scope.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(LOG_RECONNECT_DELAY_SECONDS)) => {
                        debug!(container_name = %identity.container_name, "reconnecting to log stream");
                    },
                }
            },
        }
    }
}

async fn tail_once(ctx: &Context, identity: &Identity, scope: &CancellationToken) -> TailOutcome {
    let url = ctx.config.log_url(&identity.namespace, &identity.workload, &identity.container_name);
    let resp = tokio::select! {
        _ = scope.cancelled() => return TailOutcome::Done,
        res = ctx.client.get(url.clone()).send() => match res {
            Ok(resp) => resp,
            Err(err) => {
                error!(url = %url, error = %err, "could not attach to log stream");
                return TailOutcome::Done;
            },
        },
    };

    if !resp.status().is_success() {
        error!(url = %url, status = %resp.status(), "log stream request rejected");
        return TailOutcome::Done;
    }

    let mut lines = StreamReader::new(resp.bytes_stream().map_err(io::Error::other)).lines();
    loop {
        tokio::select! {
            _ = scope.cancelled() => return TailOutcome::Done,
            line = lines.next_line() => match line {
                Ok(Some(line)) => ctx.emitter.emit(build_record(identity, &line)),
                Ok(None) => return TailOutcome::Done,
                Err(err) => {
                    warn!(url = %url, error = %err, "error reading log stream");
                    return TailOutcome::Retry;
                },
            },
        }
    }
}

// Splits a line into its timestamp prefix and the original message, then
// runs JSON promotion when the workload asked for it.  A line with no space
// has no timestamp prefix to split on and emits with both fields empty.
pub(crate) fn build_record(identity: &Identity, line: &str) -> Record {
    let (event_time, message) = line.split_once(' ').unwrap_or(("", ""));

    match &identity.decode_field {
        Some(field) => promote(identity, event_time, message, field),
        None => Record::raw(identity, event_time, message),
    }
}

fn promote(identity: &Identity, event_time: &str, message: &str, field: &str) -> Record {
    let mut fields: Map<String, Value> = match serde_json::from_str(message) {
        Ok(fields) => fields,
        Err(err) => {
            warn!(error = %err, "could not parse log message as JSON");
            return Record::raw(identity, event_time, message);
        },
    };

    let promoted = match fields.get(field).cloned() {
        Some(Value::String(message)) => {
            fields.remove(field);
            message
        },
        Some(Value::Null) | None => {
            fields.remove(field);
            String::new()
        },
        Some(value) => {
            // The field stays in the payload when it can't serve as a message
            warn!(field, value = %value, "promoted message field is not a string");
            String::new()
        },
    };

    Record::promoted(identity, event_time, promoted, fields)
}
