//! [`Backend`] implementation wiring together argv building, the line
//! parser/exit hook, and install-status probing for the Codex-family CLI.

use std::path::PathBuf;

use async_trait::async_trait;
use harness_core::backend::{Backend, InstallStatus, Invocation};
use harness_core::error::HarnessError;
use harness_core::query::Query;
use harness_core::streamer::{ExitHook, LineParser, ProcessSpec};

use crate::argv;
use crate::discovery;
use crate::parser;

/// The backend id this adapter registers under.
pub const BACKEND_ID: &str = "codex";

/// Adapter for the Codex-family CLI.
pub struct CodexBackend {
    path: PathBuf,
}

impl CodexBackend {
    /// Builds an adapter for an already-resolved executable path.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Discovers the executable on the host system, then builds an adapter
    /// from the result.
    ///
    /// # Errors
    /// Returns a [`crate::error::CodexError`] if no executable can be found.
    pub fn discover(explicit_path: Option<PathBuf>) -> Result<Self, crate::error::CodexError> {
        let path = discovery::discover_codex(explicit_path)?;
        Ok(Self::new(path))
    }
}

#[async_trait]
impl Backend for CodexBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn build_invocation(&self, query: &Query) -> Result<Invocation, HarnessError> {
        let built = argv::build_args(query);
        Ok(Invocation {
            process: ProcessSpec {
                program: self.path.clone(),
                args: built.args,
                cwd: Some(built.cwd),
                env: built.env,
            },
            cleanup_paths: Vec::new(),
        })
    }

    fn event_handlers(&self, query: &Query) -> (LineParser, Option<ExitHook>) {
        parser::build_event_handlers(query)
    }

    async fn check_install_status(&self) -> InstallStatus {
        match tokio::process::Command::new(&self.path)
            .arg("--version")
            .output()
            .await
        {
            Ok(output) if output.status.success() => InstallStatus::Installed {
                version: Some(String::from_utf8_lossy(&output.stdout).trim().to_string()),
            },
            Ok(output) => InstallStatus::NotInstalled {
                reason: format!(
                    "codex --version exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            },
            Err(e) => InstallStatus::NotInstalled {
                reason: e.to_string(),
            },
        }
    }
}
