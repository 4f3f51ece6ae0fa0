//! Crate-wide error taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Which disguise payload an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Text-reader window
    Reader,
    /// Media-player window
    Player,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::Reader => write!(f, "reader"),
            PayloadKind::Player => write!(f, "player"),
        }
    }
}

/// Errors surfaced by deskmask operations.
///
/// Side-effect steps inside a transition are best-effort: `ProcessOp`
/// failures are logged and skipped. Only configuration validation and the
/// arming precondition (`PayloadMissing`) block an operation outright.
#[derive(Debug, Error)]
pub enum Error {
    /// Persisted configuration is malformed; recovered with defaults
    #[error("failed to parse configuration at {path:?}: {source}")]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Requested boss-key combination is owned by another process
    #[error("boss key {binding} is already in use by another program")]
    HotkeyConflict { binding: String },

    /// Configured binding is unset or names a key this tool cannot register
    #[error("boss key binding {binding} is not a usable key combination")]
    InvalidBinding { binding: String },

    /// Disguise payload executable not found at either documented path
    #[error("{kind} payload not found (looked at {path:?})")]
    PayloadMissing { kind: PayloadKind, path: PathBuf },

    /// A window/process side effect failed (stale handle, access denied, ...)
    #[error("{operation} failed: {detail}")]
    ProcessOp { operation: &'static str, detail: String },

    /// Configuration write failed; in-memory state stays authoritative
    #[error("failed to save configuration to {path:?}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn process_op(operation: &'static str, detail: impl Into<String>) -> Self {
        Error::ProcessOp {
            operation,
            detail: detail.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
