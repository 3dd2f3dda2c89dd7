//! Error types for the Codex-family adapter.

use thiserror::Error;

/// Errors raised before or while building a single invocation. Failures
/// during the child's lifecycle itself are reported as stream events by
/// `harness-core`, not through this type.
#[derive(Debug, Error)]
pub enum CodexError {
    /// The Codex executable was not found at the expected path.
    #[error("codex executable not found: {0}")]
    ExecutableNotFound(String),

    /// Path lookup via `which` failed.
    #[error("executable lookup failed: {0}")]
    WhichError(#[from] which::Error),

    /// The supplied query or adapter configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O failure during discovery or capability probing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CodexError> for harness_core::HarnessError {
    fn from(e: CodexError) -> Self {
        match e {
            CodexError::ExecutableNotFound(reason) => harness_core::HarnessError::NotInstalled {
                backend: "codex".to_string(),
                reason,
            },
            CodexError::WhichError(err) => harness_core::HarnessError::NotInstalled {
                backend: "codex".to_string(),
                reason: err.to_string(),
            },
            other => harness_core::HarnessError::InvalidQuery(other.to_string()),
        }
    }
}
