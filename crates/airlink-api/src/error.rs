use thiserror::Error;

/// Top-level error type for the `airlink-api` crate.
///
/// Covers the failure modes of both capabilities: the network daemon
/// (request submission, event stream) and the platform property store.
/// `airlink-core` maps these into the public error taxonomy; consumers
/// never see this type directly.
#[derive(Debug, Error)]
pub enum Error {
    // ── Daemon ──────────────────────────────────────────────────────
    /// The daemon endpoint is not reachable (not running, socket gone).
    #[error("daemon unavailable: {reason}")]
    DaemonUnavailable { reason: String },

    /// The daemon refused the request synchronously (bad profile,
    /// unsupported operation, radio busy).
    #[error("request rejected by daemon: {reason}")]
    Rejected { reason: String },

    /// Request submission timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The daemon event stream was closed from the other side.
    #[error("daemon event stream closed")]
    StreamClosed,

    // ── Property store ──────────────────────────────────────────────
    /// No value published under the requested key.
    #[error("property not found: {key}")]
    PropertyNotFound { key: String },

    /// The value under the key could not be interpreted.
    #[error("invalid value for property {key}: {reason}")]
    InvalidProperty { key: String, reason: String },
}

impl Error {
    /// Returns `true` if this is a transient condition worth retrying
    /// at the caller's discretion.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DaemonUnavailable { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if the daemon itself turned the request down,
    /// as opposed to the request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}
