use std::borrow::Cow;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::{
    Arc,
    Mutex,
};

use chrono::{
    SecondsFormat,
    Utc,
};
use serde_json::{
    Map,
    Value,
    json,
};
use tracing::*;

use crate::identity::Identity;

// One line of container output, ready for the sink.  `event` is only present
// when JSON promotion ran on the message.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub identity: Identity,
    pub event_time: String,
    pub message: String,
    pub event: Option<Map<String, Value>>,
}

impl Record {
    pub fn raw(identity: &Identity, event_time: &str, message: &str) -> Record {
        Record {
            identity: identity.clone(),
            event_time: event_time.into(),
            message: message.into(),
            event: None,
        }
    }

    pub fn promoted(identity: &Identity, event_time: &str, message: String, event: Map<String, Value>) -> Record {
        Record {
            identity: identity.clone(),
            event_time: event_time.into(),
            message,
            event: Some(event),
        }
    }
}

// The sink every log stream writes to.  Implementations must be safe to call
// from any task; the agent shares a single emitter across the whole tree.
pub trait Emit: Send + Sync {
    fn emit(&self, record: Record);
}

pub type SharedEmitter = Arc<dyn Emit>;

pub struct JsonEmitter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonEmitter {
    pub fn stdout() -> JsonEmitter {
        JsonEmitter::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> JsonEmitter {
        JsonEmitter { out: Mutex::new(out) }
    }
}

impl Emit for JsonEmitter {
    fn emit(&self, record: Record) {
        let fields = json_fields(&record);
        let mut out = self.out.lock().expect("emitter mutex poisoned");
        if let Err(err) = writeln!(out, "{}", Value::Object(fields)) {
            error!(error = %err, "could not write record");
        }
    }
}

pub struct TextEmitter {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TextEmitter {
    pub fn stdout() -> TextEmitter {
        TextEmitter::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> TextEmitter {
        TextEmitter { out: Mutex::new(out) }
    }
}

impl Emit for TextEmitter {
    fn emit(&self, record: Record) {
        let mut line = String::new();
        let _ = write!(line, "time={} level=info msg={}", now(), quote(&record.message));
        for (key, value) in identity_pairs(&record.identity) {
            let _ = write!(line, " {key}={}", quote(value));
        }
        let _ = write!(line, " eventTime={}", quote(&record.event_time));
        for (key, value) in &record.identity.labels {
            let _ = write!(line, " label.{key}={}", quote(value));
        }
        if let Some(event) = &record.event {
            let _ = write!(line, " event={}", quote(&Value::Object(event.clone()).to_string()));
        }

        let mut out = self.out.lock().expect("emitter mutex poisoned");
        if let Err(err) = writeln!(out, "{line}") {
            error!(error = %err, "could not write record");
        }
    }
}

fn json_fields(record: &Record) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("time".into(), json!(now()));
    fields.insert("level".into(), json!("info"));
    fields.insert("msg".into(), json!(record.message));
    for (key, value) in identity_pairs(&record.identity) {
        fields.insert(key.into(), json!(value));
    }
    fields.insert("eventTime".into(), json!(record.event_time));
    for (key, value) in &record.identity.labels {
        fields.insert(format!("label.{key}"), json!(value));
    }
    if let Some(event) = &record.event {
        fields.insert("event".into(), Value::Object(event.clone()));
    }
    fields
}

fn identity_pairs(identity: &Identity) -> [(&'static str, &str); 6] {
    [
        ("cluster", &identity.cluster),
        ("namespace", &identity.namespace),
        ("pod", &identity.workload),
        ("nodeName", &identity.node),
        ("containerName", &identity.container_name),
        ("containerID", &identity.container_id),
    ]
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn quote(value: &str) -> Cow<'_, str> {
    if value.is_empty() || value.contains([' ', '"', '=']) {
        Cow::Owned(format!("{value:?}"))
    } else {
        Cow::Borrowed(value)
    }
}
