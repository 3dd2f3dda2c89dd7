//! Error types for the Claude-family adapter.

use thiserror::Error;

/// Errors raised before or while building a single invocation. Failures
/// during the child's lifecycle itself are reported as stream events by
/// `harness-core`, not through this type.
#[derive(Debug, Error)]
pub enum ClaudeError {
    /// The Claude CLI executable was not found at the expected location.
    #[error("claude executable not found: {0}")]
    ExecutableNotFound(String),

    /// Running `claude --version` failed.
    #[error("failed to check version: {0}")]
    VersionCheckFailed(String),

    /// The health-check probe reported a failure.
    #[error("claude health check failed: {stdout}")]
    DoctorFailed {
        /// Captured stdout from the health check.
        stdout: String,
        /// Captured stderr from the health check.
        stderr: String,
    },

    /// The MCP configuration could not be serialized.
    #[error("failed to serialize MCP config: {0}")]
    JsonParseError(String),

    /// The supplied query or adapter configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O failure during discovery or capability probing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ClaudeError> for harness_core::HarnessError {
    fn from(e: ClaudeError) -> Self {
        match e {
            ClaudeError::ExecutableNotFound(reason) => harness_core::HarnessError::NotInstalled {
                backend: "claude".to_string(),
                reason,
            },
            other => harness_core::HarnessError::InvalidQuery(other.to_string()),
        }
    }
}
