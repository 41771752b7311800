// Annotations recognized on a workload
pub const LOG_FORMAT_ANNOTATION_KEY: &str = "kubelogs/logformat";
pub const MESSAGE_FIELD_ANNOTATION_KEY: &str = "kubelogs/messagefield";

// Annotation values and defaults
pub const LOG_FORMAT_JSON: &str = "json";
pub const DEFAULT_MESSAGE_FIELD: &str = "msg";

// Object kinds consumed from the watch feeds
pub const NAMESPACE_KIND: &str = "Namespace";
pub const WORKLOAD_KIND: &str = "Pod";

// Timing
pub const LOG_RECONNECT_DELAY_SECONDS: u64 = 3;
