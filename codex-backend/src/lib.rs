//! The Codex-family CLI backend adapter (§4.3).
//!
//! Plugs into `harness-core` by implementing [`Backend`] for
//! [`CodexBackend`]. Everything here is specific to one CLI's argv
//! conventions and JSONL event shapes; the spawn/stream/shutdown machinery
//! lives in `harness-core`.

pub mod adapter;
pub mod argv;
pub mod discovery;
pub mod error;
pub mod mcp;
pub mod parser;

pub use adapter::{CodexBackend, BACKEND_ID};
pub use discovery::{discover_codex, CODEX_BIN_ENV_VAR};
pub use error::CodexError;
pub use harness_core::backend::Backend;
