//! The normalized query a caller issues against any backend adapter.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// One part of a multi-part prompt. Non-text parts are carried opaquely and
/// ignored when an adapter joins the prompt into a single text argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromptPart {
    /// Plain text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Image content, carried as a data URI or external reference.
    Image {
        /// Opaque image source (data URI, URL, or path).
        source: String,
    },
}

/// The prompt given to a query: either a single string or an ordered
/// sequence of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// A single prompt string.
    Text(String),
    /// An ordered sequence of prompt parts.
    Parts(Vec<PromptPart>),
}

impl Prompt {
    /// Joins the `text` parts (or the single string) with LF, ignoring any
    /// non-text parts. Mirrors the join rule used by every backend's argv
    /// builder.
    #[must_use]
    pub fn join_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    PromptPart::Text { text } => Some(text.as_str()),
                    PromptPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Reasoning-effort hint, mapped to backend-specific flags/values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    /// Low reasoning effort.
    Low,
    /// Medium reasoning effort.
    Med,
    /// High reasoning effort.
    High,
}

/// Permission mode: whether the backend may act without prompting, or must
/// stay read-only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    /// Write-capable tools are denied; sandboxing is engaged where supported.
    ReadOnly,
    /// All permissions are granted without prompting.
    Yolo,
}

/// An MCP server a query wants exposed to the child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum McpServerSpec {
    /// A server launched as a child process communicating over stdio.
    Stdio {
        /// Executable to launch.
        command: String,
        /// Arguments to the executable.
        #[serde(default)]
        args: Vec<String>,
        /// Extra environment variables for the server process.
        #[serde(default)]
        env: HashMap<String, String>,
        /// Working directory for the server process.
        #[serde(default)]
        cwd: Option<PathBuf>,
    },
    /// A server reachable over streamable HTTP.
    Http {
        /// The server's base URL.
        url: String,
        /// Extra headers to send with every request.
        #[serde(default)]
        headers: HashMap<String, String>,
    },
}

/// A JSON Schema describing a client tool's input.
pub type ToolInputSchema = serde_json::Value;

/// The result a client tool handler returns for a single invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolCallOutcome {
    /// Successful output text, if the call succeeded.
    pub content: Option<String>,
    /// Error text, if the call failed.
    pub error: Option<String>,
}

/// An in-process tool definition the caller wants exposed to the child via
/// the tool-exposure MCP server.
#[derive(Clone)]
pub struct ClientTool {
    /// The tool's name, as advertised to the child.
    pub name: String,
    /// A human-readable description.
    pub description: String,
    /// JSON Schema describing the tool's input shape.
    pub input_schema: ToolInputSchema,
    /// The in-process handler invoked on `tools/call`.
    pub handler: std::sync::Arc<
        dyn Fn(serde_json::Value) -> futures::future::BoxFuture<'static, ToolCallOutcome>
            + Send
            + Sync,
    >,
}

impl std::fmt::Debug for ClientTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The normalized input to a single backend invocation.
#[derive(Debug, Clone)]
pub struct Query {
    /// The prompt text or parts.
    pub prompt: Prompt,
    /// Optional system prompt replacement (backend-native when supported).
    pub system_prompt: Option<String>,
    /// Optional system prompt suffix (backend-native when supported).
    pub append_system_prompt: Option<String>,
    /// Working directory for the child process. Always set.
    pub cwd: PathBuf,
    /// Extra read/write roots beyond `cwd`.
    pub additional_directories: Vec<PathBuf>,
    /// Extra environment entries, merged last (wins over adapter defaults).
    pub env: HashMap<String, String>,
    /// Backend-opaque model identifier.
    pub model: Option<String>,
    /// Reasoning-effort hint.
    pub thinking: Option<ThinkingLevel>,
    /// A session id to resume, if any.
    pub resume_session_id: Option<String>,
    /// Whether resuming should fork into a new session. Requires
    /// `resume_session_id`.
    pub fork_session: bool,
    /// Permission mode. Always set.
    pub mode: PermissionMode,
    /// Tool names the backend should allow (if it has a named-tool concept).
    pub allowed_tools: Vec<String>,
    /// Tool names the backend should disallow.
    pub disallowed_tools: Vec<String>,
    /// MCP servers to expose to the child, keyed by server name.
    pub mcp_servers: HashMap<String, McpServerSpec>,
    /// In-process client tools to expose via the tool-exposure server.
    pub client_tools: Vec<ClientTool>,
    /// Cancellation handle for this query.
    pub signal: CancellationToken,
}

impl Query {
    /// Validates the invariants of §3: `forkSession` requires
    /// `resumeSessionId`; MCP server names must be non-empty.
    ///
    /// # Errors
    /// Returns a human-readable message describing the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.fork_session && self.resume_session_id.is_none() {
            return Err("forkSession requires resumeSessionId".to_string());
        }
        if self.mcp_servers.keys().any(|name| name.is_empty()) {
            return Err("MCP server name must be non-empty".to_string());
        }
        Ok(())
    }
}
