//! Streamable-HTTP MCP server exposing in-process client tools to a
//! backend CLI child process (§4.4).
//!
//! Each query that supplies `clientTools` gets its own short-lived server
//! instance, bound to a random localhost port and protected by a bearer
//! token minted at launch. `harness-core` depends only on the
//! [`harness_core::tool_server::ToolServer`]/[`harness_core::tool_server::ToolServerLauncher`]
//! traits implemented here, never on this crate directly.

pub mod jsonrpc;
pub mod launcher;
pub mod server;
pub mod session;
pub mod token;

pub use launcher::{HttpToolServer, HttpToolServerLauncher};
