//! The `/mcp` streamable-HTTP router and request handlers (§4.4).

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use harness_core::query::ClientTool;
use serde_json::{json, Value};

use crate::jsonrpc::{self, Request};
use crate::session::SessionTable;

const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state for one launched server instance.
pub struct AppState {
    /// The tools this server exposes, in configuration order.
    pub tools: Vec<ClientTool>,
    /// The bearer token every request must present.
    pub token: String,
    /// Live `sessionId` set.
    pub sessions: SessionTable,
}

/// Builds the `/mcp` router over `state`.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(handle_post).get(handle_get).delete(handle_delete))
        .with_state(state)
}

fn check_auth(state: &AppState, headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.token)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(jsonrpc::err(&Value::Null, jsonrpc::BAD_REQUEST_CODE, "Unauthorized")),
    )
        .into_response()
}

fn bad_request(id: &Value) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(jsonrpc::err(
            id,
            jsonrpc::BAD_REQUEST_CODE,
            "Bad Request: missing session ID or not an init request",
        )),
    )
        .into_response()
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {"tools": {}},
        "serverInfo": {"name": "harness-client-tools", "version": env!("CARGO_PKG_VERSION")},
    })
}

async fn handle_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !check_auth(&state, &headers) {
        return unauthorized();
    }

    let Ok(request) = serde_json::from_value::<Request>(body) else {
        return bad_request(&Value::Null);
    };

    match session_id(&headers) {
        None if request.method == "initialize" => {
            let new_id = crate::token::generate();
            state.sessions.insert(new_id.clone()).await;
            let mut response = Json(jsonrpc::ok(&request.id, initialize_result())).into_response();
            if let Ok(value) = HeaderValue::from_str(&new_id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(SESSION_HEADER), value);
            }
            response
        }
        Some(sid) if state.sessions.contains(&sid).await => dispatch(&state, &request).await,
        _ => bad_request(&request.id),
    }
}

async fn handle_get(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !check_auth(&state, &headers) {
        return unauthorized();
    }
    match session_id(&headers) {
        Some(sid) if state.sessions.contains(&sid).await => StatusCode::OK.into_response(),
        _ => bad_request(&Value::Null),
    }
}

async fn handle_delete(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if !check_auth(&state, &headers) {
        return unauthorized();
    }
    match session_id(&headers) {
        Some(sid) if state.sessions.contains(&sid).await => {
            state.sessions.remove(&sid).await;
            StatusCode::OK.into_response()
        }
        _ => bad_request(&Value::Null),
    }
}

async fn dispatch(state: &AppState, request: &Request) -> Response {
    match request.method.as_str() {
        "tools/list" => {
            let tools: Vec<Value> = state
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "inputSchema": tool.input_schema,
                    })
                })
                .collect();
            Json(jsonrpc::ok(&request.id, json!({ "tools": tools }))).into_response()
        }
        "tools/call" => call_tool(state, request).await,
        other => Json(jsonrpc::err(
            &request.id,
            jsonrpc::METHOD_NOT_FOUND_CODE,
            format!("Unknown method: {other}"),
        ))
        .into_response(),
    }
}

async fn call_tool(state: &AppState, request: &Request) -> Response {
    let name = request
        .params
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let arguments = request
        .params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let Some(tool) = state.tools.iter().find(|t| t.name == name) else {
        return Json(jsonrpc::ok(
            &request.id,
            json!({
                "content": [{"type": "text", "text": format!("Unknown tool: {name}")}],
                "isError": true,
            }),
        ))
        .into_response();
    };

    let outcome = (tool.handler)(arguments).await;
    let (text, is_error) = match (outcome.content, outcome.error) {
        (_, Some(error)) => (error, true),
        (Some(content), None) => (content, false),
        (None, None) => (String::new(), false),
    };

    Json(jsonrpc::ok(
        &request.id,
        json!({
            "content": [{"type": "text", "text": text}],
            "isError": is_error,
        }),
    ))
    .into_response()
}
