// ── Core error types ──
//
// User-facing errors from netstate-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<netstate_api::Error>`
// impl translates transport-layer errors into device-level variants.
// Per-record structural mismatches never reach this type; they stay
// inside the walker and correlator.

use netstate_api::ValueKind;
use thiserror::Error;

use crate::pathspec::PathSpecError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ── Query errors ─────────────────────────────────────────────────
    /// One of a snapshot's queries failed; the snapshot is discarded.
    #[error("Query {query} failed: {source}")]
    QueryFailed {
        query: &'static str,
        #[source]
        source: Box<CoreError>,
    },

    /// A leaf carried a different value variant than its template declares.
    #[error("Query {query} returned {found} at {path}, expected {expected}")]
    ValueKind {
        query: &'static str,
        path: String,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error(transparent)]
    InvalidPathSpec(#[from] PathSpecError),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Innermost cause, looking through [`QueryFailed`](Self::QueryFailed).
    pub fn root(&self) -> &CoreError {
        match self {
            Self::QueryFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_query(self, query: &'static str) -> Self {
        match self {
            already @ (Self::QueryFailed { .. } | Self::ValueKind { .. }) => already,
            other => Self::QueryFailed {
                query,
                source: Box::new(other),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<netstate_api::Error> for CoreError {
    fn from(err: netstate_api::Error) -> Self {
        match err {
            netstate_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            netstate_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        target: e
                            .url()
                            .and_then(|u| u.host_str().map(str::to_owned))
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Transport {
                        message: e.to_string(),
                    }
                }
            }
            netstate_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            netstate_api::Error::InvalidTarget { target, reason } => CoreError::Config {
                message: format!("Invalid target '{target}': {reason}"),
            },
            netstate_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                target: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            netstate_api::Error::Gateway { status, message } => CoreError::Transport {
                message: format!("gateway returned HTTP {status}: {message}"),
            },
            netstate_api::Error::Deserialization { message, body: _ } => CoreError::Transport {
                message: format!("undecodable response: {message}"),
            },
        }
    }
}
