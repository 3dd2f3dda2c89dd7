//! The seam between the generic streamer and a specific CLI's conventions
//! (§4.2, §4.3, §9 "small variant set").
//!
//! A backend adapter is three pure-ish pieces: build the child's argv/env
//! from a [`Query`], parse its stdout lines into envelope [`Event`]s, and
//! decide what to do when it exits. [`Registry`](crate::registry::Registry)
//! holds a set of these by id.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::HarnessError;
use crate::query::Query;
use crate::streamer::{ExitHook, LineParser, ProcessSpec};

/// Whether a backend's executable was found and is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    /// The executable was found and responded to a health probe.
    Installed {
        /// Version string reported by the executable, if parsed.
        version: Option<String>,
    },
    /// The executable could not be found or failed its health probe.
    NotInstalled {
        /// Human-readable reason.
        reason: String,
    },
}

/// Everything the streamer needs to launch one query against one backend,
/// plus filesystem paths the wrapper must remove once the stream ends
/// (e.g. a temporary MCP config file).
#[derive(Debug)]
pub struct Invocation {
    /// The process to spawn.
    pub process: ProcessSpec,
    /// Paths to delete after the child has exited, regardless of outcome.
    pub cleanup_paths: Vec<PathBuf>,
}

/// A CLI-specific adapter. Implementations hold no per-query state; all
/// per-query data flows through the `query` parameter.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used as the registry key (e.g. `"claude"`,
    /// `"codex"`).
    fn id(&self) -> &str;

    /// Builds the argv/env/cwd for this query, projecting `query.mcp_servers`
    /// into whatever native shape this backend expects.
    ///
    /// # Errors
    /// Returns [`HarnessError::InvalidQuery`] if the query violates a
    /// backend-specific constraint this adapter enforces.
    fn build_invocation(&self, query: &Query) -> Result<Invocation, HarnessError>;

    /// Builds the line parser and exit hook for one invocation.
    ///
    /// The two closures share interior state (typically a latched `Usage`):
    /// the line parser observes the usage-bearing event and stashes it, and
    /// the exit hook reads the stash to synthesize `Complete`. Bundling them
    /// in one call is what lets that state stay local to the invocation
    /// instead of living in the wrapper.
    fn event_handlers(&self, query: &Query) -> (LineParser, Option<ExitHook>);

    /// Probes whether the backend's executable is present and healthy.
    async fn check_install_status(&self) -> InstallStatus;
}
