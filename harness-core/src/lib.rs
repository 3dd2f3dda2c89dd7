//! Normalized spawn-and-stream runtime shared by every coding-agent backend
//! adapter.
//!
//! This crate owns the parts of the harness that don't know which CLI
//! they're talking to: the [`query`]/[`event`] data model, the generic
//! process [`streamer`], the [`backend`] seam a specific CLI adapter
//! implements, the [`registry`] of adapters, and the [`wrapper`] that ties
//! a query to a registered backend and streams the result.

pub mod backend;
pub mod error;
pub mod event;
pub mod query;
pub mod registry;
pub mod streamer;
pub mod tool_server;
pub mod wrapper;

pub use backend::{Backend, InstallStatus, Invocation};
pub use error::HarnessError;
pub use event::{ErrorCode, Event, Usage};
pub use query::{
    ClientTool, McpServerSpec, PermissionMode, Prompt, PromptPart, Query, ThinkingLevel,
    ToolCallOutcome, ToolInputSchema,
};
pub use registry::Registry;
pub use streamer::{ExitHook, LineParser, ProcessSpec};
pub use tool_server::{ToolServer, ToolServerLauncher};
pub use wrapper::run_query;
