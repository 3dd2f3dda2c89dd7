//! Error type shared by the streamer, registry, and wrapper.

use crate::event::ErrorCode;
use thiserror::Error;

/// Errors surfaced synchronously (not as stream events) by the harness core.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A backend id was registered twice.
    #[error("backend '{0}' is already registered")]
    DuplicateBackend(String),

    /// A backend id was requested but never registered.
    #[error("backend '{0}' is not registered")]
    UnknownBackend(String),

    /// Executable discovery failed before streaming began.
    #[error("backend '{backend}' is not installed: {reason}")]
    NotInstalled {
        /// The backend id.
        backend: String,
        /// Why discovery failed.
        reason: String,
    },

    /// A query invariant was violated (§3).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An I/O failure not tied to a specific child-process lifecycle stage.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// `client_tools` was non-empty but no tool-exposure server could be
    /// started for it.
    #[error("tool-exposure server unavailable: {0}")]
    ToolServerUnavailable(String),
}

impl HarnessError {
    /// Maps this synchronous error to the §7 taxonomy, for callers that want
    /// to treat synchronous and streamed failures uniformly.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotInstalled { .. } => ErrorCode::NotInstalled,
            Self::DuplicateBackend(_) | Self::UnknownBackend(_) | Self::InvalidQuery(_) => {
                ErrorCode::Unknown
            }
            Self::Io(_) => ErrorCode::ProcessCrashed,
            Self::ToolServerUnavailable(_) => ErrorCode::Unknown,
        }
    }
}
