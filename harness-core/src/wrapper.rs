//! Top-level entry point: resolve a backend, project MCP/client-tool
//! config, spawn, and stream (§4.5).

use std::collections::HashMap;
use std::path::PathBuf;

use async_stream::stream;
use futures::{Stream, StreamExt};

use crate::error::HarnessError;
use crate::event::{ErrorCode, Event};
use crate::query::{McpServerSpec, Query};
use crate::registry::Registry;
use crate::tool_server::{ToolServer, ToolServerLauncher};

/// The well-known MCP server name the harness injects when `client_tools`
/// is non-empty. Chosen to be unlikely to collide with a caller-supplied
/// server name; collisions are resolved in the caller's favor by simply
/// overwriting this entry, since `client_tools` always wins.
const CLIENT_TOOLS_SERVER_NAME: &str = "__harness_client_tools";

/// Removes every path in `invocation.cleanup_paths` when dropped, whether
/// the stream ran to completion or the caller simply stopped polling it
/// mid-`await` (the `stream!` generator drops its locals in that case, the
/// same way `tool_server`'s own `Drop` impl tears itself down).
///
/// `Drop` can't be async, so removal is a synchronous, best-effort
/// `std::fs` call; errors (path already gone, permissions) are swallowed,
/// matching the wrapper's existing "swallow all teardown errors" policy.
struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.is_dir() {
                let _ = std::fs::remove_dir_all(path);
            } else {
                let _ = std::fs::remove_file(path);
            }
        }
    }
}

/// Runs `query` against the backend registered as `backend_id`.
///
/// Validates the query, starts a tool-exposure server via `tool_launcher`
/// if `query.client_tools` is non-empty (injecting it into
/// `query.mcp_servers` under a reserved name), asks the backend to build an
/// invocation (argv/env, MCP projection), and streams the result. Cleanup
/// (temp files via a `CleanupGuard`, the tool-exposure server via its own
/// `Drop`) is unconditional: it runs whether the stream ends normally, is
/// aborted, or is simply dropped early by the caller.
pub fn run_query<'a>(
    registry: &'a Registry,
    backend_id: &'a str,
    mut query: Query,
    tool_launcher: Option<&'a dyn ToolServerLauncher>,
) -> impl Stream<Item = Event> + 'a {
    stream! {
        if let Err(message) = query.validate() {
            yield Event::Error { error: message, code: ErrorCode::Unknown };
            return;
        }

        let backend = match registry.get(backend_id) {
            Ok(backend) => backend,
            Err(e) => {
                yield Event::Error { error: e.to_string(), code: e.code() };
                return;
            }
        };

        let mut tool_server: Option<Box<dyn ToolServer>> = None;
        if !query.client_tools.is_empty() {
            let launch_result = match tool_launcher {
                Some(launcher) => launcher.launch(query.client_tools.clone()).await,
                None => Err(HarnessError::ToolServerUnavailable(
                    "query has client_tools but no tool_launcher was configured".to_string(),
                )),
            };
            match launch_result {
                Ok(server) => {
                    let mut headers = HashMap::new();
                    headers.insert(
                        "Authorization".to_string(),
                        format!("Bearer {}", server.bearer_token()),
                    );
                    query.mcp_servers.insert(
                        CLIENT_TOOLS_SERVER_NAME.to_string(),
                        McpServerSpec::Http { url: server.url(), headers },
                    );
                    tool_server = Some(server);
                }
                Err(e) => {
                    yield Event::Error { error: e.to_string(), code: e.code() };
                    return;
                }
            }
        }

        let invocation = match backend.build_invocation(&query) {
            Ok(invocation) => invocation,
            Err(e) => {
                yield Event::Error { error: e.to_string(), code: e.code() };
                drop(tool_server);
                return;
            }
        };

        // Bound to the generator's scope so it is dropped, and thus runs,
        // whether the loop below finishes, the signal aborts it, or the
        // caller simply stops polling this stream mid-`await`.
        let _cleanup_guard = CleanupGuard { paths: invocation.cleanup_paths.clone() };

        let (parser, hook) = backend.event_handlers(&query);
        let mut inner = Box::pin(crate::streamer::stream(
            invocation.process,
            query.signal.clone(),
            parser,
            hook,
        ));
        while let Some(event) = inner.next().await {
            yield event;
        }

        drop(tool_server);
    }
}
