mod cluster_test;

use std::sync::Arc;

use kl_core::config::Config;
use kl_core::emitter::SharedEmitter;
use kl_testutils::*;

use crate::context::Context;

pub(crate) fn test_context(base_url: &str, emitter: SharedEmitter) -> Context {
    let config = Config::new(base_url, TEST_CLUSTER).unwrap();
    Context {
        client: reqwest::Client::new(),
        config: Arc::new(config),
        emitter,
    }
}

pub(crate) fn recording_context(base_url: &str) -> (Context, Arc<RecordingEmitter>) {
    let emitter = Arc::new(RecordingEmitter::new());
    (test_context(base_url, emitter.clone()), emitter)
}
