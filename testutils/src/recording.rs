use std::sync::Mutex;
use std::time::Duration;

use anyhow::bail;
use kl_core::emitter::{
    Emit,
    Record,
};
use tokio::time::Instant;

// An emitter that remembers everything it was handed, for asserting on the
// records a test scenario produced.
#[derive(Default)]
pub struct RecordingEmitter {
    records: Mutex<Vec<Record>>,
}

impl RecordingEmitter {
    pub fn new() -> RecordingEmitter {
        RecordingEmitter::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    // Polls until at least `count` records have arrived; the tree emits from
    // spawned tasks so tests can't observe records synchronously.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> anyhow::Result<Vec<Record>> {
        let deadline = Instant::now() + timeout;
        loop {
            let records = self.records();
            if records.len() >= count {
                return Ok(records);
            }
            if Instant::now() > deadline {
                bail!("timed out waiting for {count} records (got {})", records.len());
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Emit for RecordingEmitter {
    fn emit(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}
