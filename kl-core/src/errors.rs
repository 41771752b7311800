pub use anyhow::{
    anyhow,
    bail,
    ensure,
};
pub use thiserror::Error;

pub type EmptyResult = anyhow::Result<()>;

// The failure modes that cross a function boundary.  At the root these are
// all fatal and propagate with `?` out of main; an inner stream failing with
// the same kinds is logged and swallowed by the level above it, which just
// tears down that subtree.  Per-event and per-line failures never leave the
// function that observes them and stay as log sites instead of variants
// here.  The snake-case constructors return anyhow::Error directly so call
// sites can `map_err`/`return Err` without spelling out the wrapping.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid base URL {0:?}")]
    ConfigInvalid(String),

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("upstream rejected stream with status {0}")]
    UpstreamRejected(reqwest::StatusCode),

    #[error("watch stream disconnected")]
    UpstreamDisconnected,
}

impl AgentError {
    pub fn config_invalid(url: &str) -> anyhow::Error {
        anyhow!(AgentError::ConfigInvalid(url.into()))
    }

    pub fn upstream_unreachable(err: reqwest::Error) -> anyhow::Error {
        anyhow!(AgentError::UpstreamUnreachable(err))
    }

    pub fn upstream_rejected(status: reqwest::StatusCode) -> anyhow::Error {
        anyhow!(AgentError::UpstreamRejected(status))
    }

    pub fn upstream_disconnected() -> anyhow::Error {
        anyhow!(AgentError::UpstreamDisconnected)
    }
}
