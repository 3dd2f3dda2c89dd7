//! Capability probing types for the Claude-family adapter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Individual feature that the Claude CLI may support, detected from
/// `--help` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// The `stream-json` output format.
    StreamJson,
    /// The `--json-schema` flag.
    JsonSchema,
    /// The `--system-prompt` flag.
    SystemPrompt,
    /// The `--append-system-prompt` flag.
    AppendSystemPrompt,
    /// The `--mcp-config` flag.
    Mcp,
    /// The `--strict-mcp-config` flag.
    StrictMcp,
    /// The `--tools` flag family (`--allowedTools`/`--disallowed-tools`).
    ToolsFlag,
}

/// Set of features detected from the Claude CLI help text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Features present in this CLI build.
    pub features: BTreeSet<Feature>,
}

impl Capabilities {
    /// Returns `true` if the given feature is supported.
    #[must_use]
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

/// Report produced by the initialization / health-check sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitReport {
    /// Resolved path to the Claude CLI executable.
    pub claude_path: PathBuf,
    /// Version string reported by `claude --version`.
    pub version: String,
    /// Whether the health check passed.
    pub doctor_ok: bool,
    /// Captured stdout from the health check.
    pub doctor_stdout: String,
    /// Captured stderr from the health check.
    pub doctor_stderr: String,
    /// Detected CLI capabilities.
    pub capabilities: Capabilities,
}
