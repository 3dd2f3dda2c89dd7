//! [`Backend`] implementation wiring together argv building, the line
//! parser/exit hook, and install-status probing for the Claude-family CLI.

use std::path::PathBuf;

use async_trait::async_trait;
use harness_core::backend::{Backend, InstallStatus, Invocation};
use harness_core::error::HarnessError;
use harness_core::query::Query;
use harness_core::streamer::{ExitHook, LineParser, ProcessSpec};

use crate::argv::{self, AdapterOptions};
use crate::init;
use crate::parser;

/// The backend id this adapter registers under.
pub const BACKEND_ID: &str = "claude";

/// Adapter for the Claude-family CLI.
pub struct ClaudeBackend {
    path: PathBuf,
    options: AdapterOptions,
}

impl ClaudeBackend {
    /// Builds an adapter for an already-resolved executable path.
    #[must_use]
    pub fn new(path: PathBuf, options: AdapterOptions) -> Self {
        Self { path, options }
    }

    /// Discovers the executable and probes its capabilities, then builds an
    /// adapter from the result.
    ///
    /// # Errors
    /// Returns a [`crate::error::ClaudeError`] if discovery or probing
    /// fails.
    pub async fn discover(
        explicit_path: Option<PathBuf>,
        options: AdapterOptions,
    ) -> Result<Self, crate::error::ClaudeError> {
        let report = init::init(explicit_path).await?;
        Ok(Self::new(report.claude_path, options))
    }
}

#[async_trait]
impl Backend for ClaudeBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn build_invocation(&self, query: &Query) -> Result<Invocation, HarnessError> {
        let built = argv::build_args(query, &self.options)?;
        Ok(Invocation {
            process: ProcessSpec {
                program: self.path.clone(),
                args: built.args,
                cwd: Some(built.cwd),
                env: built.env,
            },
            cleanup_paths: built.cleanup_paths,
        })
    }

    fn event_handlers(&self, _query: &Query) -> (LineParser, Option<ExitHook>) {
        parser::build_event_handlers()
    }

    async fn check_install_status(&self) -> InstallStatus {
        match init::init(Some(self.path.clone())).await {
            Ok(report) if report.doctor_ok => InstallStatus::Installed {
                version: Some(report.version),
            },
            Ok(report) => InstallStatus::NotInstalled {
                reason: format!("health check failed: {}", report.doctor_stderr),
            },
            Err(e) => InstallStatus::NotInstalled {
                reason: e.to_string(),
            },
        }
    }
}
