//! Binding a fresh server instance to an ephemeral localhost port and
//! wiring it up as a [`ToolServer`]/[`ToolServerLauncher`] pair (§4.4).

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use harness_core::error::HarnessError;
use harness_core::query::ClientTool;
use harness_core::tool_server::{ToolServer, ToolServerLauncher};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::server::{build_router, AppState};
use crate::session::SessionTable;
use crate::token;

/// Launches one tool-exposure server per query, bound to `127.0.0.1` on an
/// OS-chosen port.
#[derive(Default)]
pub struct HttpToolServerLauncher;

#[async_trait]
impl ToolServerLauncher for HttpToolServerLauncher {
    async fn launch(&self, tools: Vec<ClientTool>) -> Result<Box<dyn ToolServer>, HarnessError> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| HarnessError::ToolServerUnavailable(e.to_string()))?;
        let addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| HarnessError::ToolServerUnavailable(e.to_string()))?;

        let bearer_token = token::generate();
        let state = Arc::new(AppState {
            tools,
            token: bearer_token.clone(),
            sessions: SessionTable::new(),
        });
        let router = build_router(Arc::clone(&state));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle: JoinHandle<()> = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!("tool-exposure server exited with error: {e}");
            }
            state.sessions.clear().await;
        });

        Ok(Box::new(HttpToolServer {
            url: format!("http://{addr}/mcp"),
            token: bearer_token,
            shutdown: Some(shutdown_tx),
            _handle: handle,
        }))
    }
}

/// A running tool-exposure server instance. Dropping it signals graceful
/// shutdown; the listener and any open transports close once the
/// in-flight requests drain.
pub struct HttpToolServer {
    url: String,
    token: String,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl ToolServer for HttpToolServer {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn bearer_token(&self) -> &str {
        &self.token
    }
}

impl Drop for HttpToolServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
