//! The seam between [`crate::wrapper::run_query`] and whatever process
//! exposes `Query::client_tools` to the child over MCP (§4.4).
//!
//! `harness-core` only depends on this trait, not on an HTTP server
//! implementation, so that the tool-exposure crate can depend on
//! `harness-core` without a cycle. An application wires a concrete launcher
//! (backed by an `axum` server) into [`crate::wrapper::run_query`].

use async_trait::async_trait;

use crate::error::HarnessError;
use crate::query::ClientTool;

/// A running tool-exposure server for one query.
pub trait ToolServer: Send + Sync {
    /// The URL the child should use to reach this server's MCP endpoint.
    fn url(&self) -> String;

    /// The bearer token the child must present on every request.
    fn bearer_token(&self) -> &str;
}

/// Launches a [`ToolServer`] scoped to one query's client tools.
#[async_trait]
pub trait ToolServerLauncher: Send + Sync {
    /// Starts a server exposing `tools` and returns a handle to it. Dropping
    /// the returned handle must stop the server.
    ///
    /// # Errors
    /// Returns a [`HarnessError`] if the server could not be started (e.g.
    /// no local port was available).
    async fn launch(
        &self,
        tools: Vec<ClientTool>,
    ) -> Result<Box<dyn ToolServer>, HarnessError>;
}
