use std::sync::Arc;

use kl_core::prelude::*;

// Everything injected at construction and shared down the tree: the HTTP
// client, the parsed options, and the record sink.  Cloning is cheap; every
// node carries its own copy.
#[derive(Clone)]
pub(crate) struct Context {
    pub client: reqwest::Client,
    pub config: Arc<Config>,
    pub emitter: SharedEmitter,
}
