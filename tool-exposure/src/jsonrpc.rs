//! Minimal JSON-RPC 2.0 envelope used over the `/mcp` transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC request, as sent by the child process.
#[derive(Debug, Deserialize)]
pub struct Request {
    /// The request id, echoed back in the response.
    #[serde(default)]
    pub id: Value,
    /// The method being invoked (`initialize`, `tools/list`, `tools/call`, ...).
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// Error code for "bad request"/"unauthorized" conditions (§4.4).
pub const BAD_REQUEST_CODE: i64 = -32000;
/// Error code for an unrecognized method.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct RpcError {
    /// The numeric error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
}

/// Builds a successful JSON-RPC response body.
pub fn ok(id: &Value, result: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC error response body.
pub fn err(id: &Value, code: i64, message: impl Into<String>) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": RpcError { code, message: message.into() },
    })
}
