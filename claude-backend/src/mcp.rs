//! MCP server map projection to Claude's `--mcp-config` JSON file (§4.2, §6).

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use harness_core::McpServerSpec;
use serde_json::{json, Map, Value};

use crate::error::ClaudeError;

fn project_entry(spec: &McpServerSpec) -> Value {
    match spec {
        McpServerSpec::Stdio {
            command,
            args,
            env,
            cwd,
        } => {
            let mut obj = Map::new();
            obj.insert("command".to_string(), json!(command));
            if !args.is_empty() {
                obj.insert("args".to_string(), json!(args));
            }
            if !env.is_empty() {
                obj.insert("env".to_string(), json!(env));
            }
            if let Some(cwd) = cwd {
                obj.insert("cwd".to_string(), json!(cwd));
            }
            Value::Object(obj)
        }
        McpServerSpec::Http { url, headers } => {
            let mut obj = Map::new();
            obj.insert("type".to_string(), json!("http"));
            obj.insert("url".to_string(), json!(url));
            if !headers.is_empty() {
                obj.insert("headers".to_string(), json!(headers));
            }
            Value::Object(obj)
        }
    }
}

/// Projects `servers` into a `{mcpServers: {...}}` document and writes it to
/// a fresh temp file, returning its path. The caller is responsible for
/// deleting the path once the child has exited.
///
/// # Errors
/// Returns [`ClaudeError::JsonParseError`] if serialization fails, or
/// [`ClaudeError::InvalidConfig`] if the temp file cannot be created or
/// written.
pub fn write_mcp_config(
    servers: &HashMap<String, McpServerSpec>,
) -> Result<PathBuf, ClaudeError> {
    let mut entries = Map::new();
    for (name, spec) in servers {
        entries.insert(name.clone(), project_entry(spec));
    }
    let document = json!({ "mcpServers": Value::Object(entries) });
    let rendered = serde_json::to_string_pretty(&document)
        .map_err(|e| ClaudeError::JsonParseError(e.to_string()))?;

    let mut file = tempfile::Builder::new()
        .prefix("harness-claude-mcp-")
        .suffix(".json")
        .tempfile()
        .map_err(|e| {
            ClaudeError::InvalidConfig(format!("failed to create MCP config temp file: {e}"))
        })?;
    file.write_all(rendered.as_bytes())
        .map_err(|e| ClaudeError::InvalidConfig(format!("failed to write MCP config: {e}")))?;

    file.into_temp_path()
        .keep()
        .map_err(|e| ClaudeError::InvalidConfig(format!("failed to persist MCP config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_entry_omits_empty_collections() {
        let mut servers = HashMap::new();
        servers.insert(
            "fs".to_string(),
            McpServerSpec::Stdio {
                command: "mcp-fs".to_string(),
                args: vec![],
                env: HashMap::new(),
                cwd: None,
            },
        );
        let path = write_mcp_config(&servers).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&contents).unwrap();
        let entry = &parsed["mcpServers"]["fs"];
        assert_eq!(entry["command"], "mcp-fs");
        assert!(entry.get("args").is_none());
        assert!(entry.get("env").is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn http_entry_carries_type_and_headers() {
        let mut servers = HashMap::new();
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer X".to_string());
        servers.insert(
            "remote".to_string(),
            McpServerSpec::Http {
                url: "https://example.test/mcp".to_string(),
                headers,
            },
        );
        let path = write_mcp_config(&servers).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&contents).unwrap();
        let entry = &parsed["mcpServers"]["remote"];
        assert_eq!(entry["type"], "http");
        assert_eq!(entry["headers"]["Authorization"], "Bearer X");
        let _ = std::fs::remove_file(path);
    }
}
