use bytes::{
    Buf,
    BytesMut,
};
use futures::StreamExt;
use kl_core::errors::*;
use kl_core::prelude::*;
use reqwest::{
    Client,
    Url,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::*;

// A watch connection to the orchestrator, adapted into a sequence of typed
// events.  The response body is a concatenation of bare JSON values with no
// delimiter between them, so the decoder task accumulates bytes and peels
// complete values off the front as they arrive.  The channel has capacity 1:
// a consumer that stops reading stalls the decoder, which in turn stops
// reading from the socket.
//
// The stream never restarts itself.  Whatever ends it (peer EOF, a decode
// failure, cancellation) also cancels the scope it was constructed under, so
// the owning node tears down alongside it and gets re-created by its parent
// on the next upstream event.
#[derive(Debug)]
pub struct EventStream {
    events: mpsc::Receiver<Event>,
    cancel: CancellationToken,
}

impl EventStream {
    pub async fn connect(client: &Client, url: Url, parent: &CancellationToken) -> anyhow::Result<EventStream> {
        let cancel = parent.child_token();
        let resp = tokio::select! {
            _ = cancel.cancelled() => return Err(AgentError::upstream_disconnected()),
            res = client.get(url.clone()).send() => res.map_err(AgentError::upstream_unreachable)?,
        };

        let status = resp.status();
        if !status.is_success() {
            cancel.cancel();
            return Err(AgentError::upstream_rejected(status));
        }

        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(decode_loop(resp, tx, cancel.clone(), url));
        Ok(EventStream { events: rx, cancel })
    }

    // Yields events in wire order; None once the stream has terminated
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

async fn decode_loop(resp: reqwest::Response, tx: mpsc::Sender<Event>, cancel: CancellationToken, url: Url) {
    let mut body = resp.bytes_stream();
    let mut buf = BytesMut::new();
    let mut eof = false;

    'outer: while !eof {
        tokio::select! {
            _ = cancel.cancelled() => break 'outer,
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    warn!(url = %url, error = %err, "error reading watch stream");
                    break 'outer;
                },
                None => eof = true,
            },
        }

        loop {
            match next_event(&mut buf) {
                Ok(Some(evt)) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break 'outer,
                        res = tx.send(evt) => {
                            if res.is_err() {
                                break 'outer;
                            }
                        },
                    }
                },
                Ok(None) => break,
                Err(err) => {
                    warn!(url = %url, error = %err, "could not decode watch event");
                    break 'outer;
                },
            }
        }
    }

    if eof && !buf.is_empty() {
        debug!(url = %url, bytes = buf.len(), "watch stream ended mid-event");
    }

    // Dropping `body` closes the connection; cancelling here makes sure every
    // sibling operation under the same scope winds down with us.
    cancel.cancel();
}

// Decodes one complete JSON value off the front of the buffer.  Ok(None)
// means the buffer holds only part of a value (or whitespace) and more bytes
// are needed.
pub(crate) fn next_event(buf: &mut BytesMut) -> Result<Option<Event>, serde_json::Error> {
    let (decoded, offset) = {
        let mut iter = serde_json::Deserializer::from_slice(buf).into_iter::<Event>();
        (iter.next(), iter.byte_offset())
    };

    match decoded {
        None => {
            buf.advance(offset);
            Ok(None)
        },
        Some(Ok(evt)) => {
            buf.advance(offset);
            Ok(Some(evt))
        },
        Some(Err(err)) if err.is_eof() => Ok(None),
        Some(Err(err)) => Err(err),
    }
}

#[cfg(test)]
impl EventStream {
    // A stream detached from any HTTP connection, fed directly by the test
    pub(crate) fn from_parts(events: mpsc::Receiver<Event>, cancel: CancellationToken) -> EventStream {
        EventStream { events, cancel }
    }

    pub(crate) fn test_channel() -> (mpsc::Sender<Event>, EventStream) {
        let (tx, rx) = mpsc::channel(1);
        (tx, EventStream::from_parts(rx, CancellationToken::new()))
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
