//! The Claude-family CLI backend adapter (§4.2).
//!
//! Plugs into `harness-core` by implementing [`Backend`] for
//! [`ClaudeBackend`]. Everything here is specific to one CLI's argv
//! conventions and JSONL event shapes; the spawn/stream/shutdown machinery
//! lives in `harness-core`.

pub mod adapter;
pub mod argv;
pub mod discovery;
pub mod error;
pub mod init;
pub mod mcp;
pub mod parser;
pub mod types;

pub use adapter::{ClaudeBackend, BACKEND_ID};
pub use argv::AdapterOptions;
pub use discovery::{discover_claude, CC_BIN_ENV_VAR};
pub use error::ClaudeError;
pub use harness_core::backend::Backend;
