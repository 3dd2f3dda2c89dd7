//! MCP server map projection to Codex's `-c key=value` TOML overrides
//! (§4.3, §6).

use std::collections::HashMap;

use harness_core::McpServerSpec;

fn sanitize_name(name: &str) -> String {
    name.replace('-', "_")
}

fn escape_toml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", escape_toml_string(s))
}

/// Strips a case-insensitive `Bearer <token>` prefix, mirroring
/// `/^Bearer\s+(.+)$/i`.
fn strip_bearer_prefix(value: &str) -> Option<&str> {
    let mut parts = value.splitn(2, char::is_whitespace);
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let rest = parts.next()?.trim_start();
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Projects `servers` into a sequence of `key=value` TOML dotted-key
/// overrides — one consumed per `-c` argument — plus an environment
/// overlay carrying bearer tokens redirected out of argv.
///
/// Server names are sorted before projection so the emitted argv is
/// deterministic across runs of the same query.
#[must_use]
pub fn project_overrides(
    servers: &HashMap<String, McpServerSpec>,
) -> (Vec<String>, HashMap<String, String>) {
    let mut overrides = Vec::new();
    let mut env = HashMap::new();

    let mut names: Vec<&String> = servers.keys().collect();
    names.sort();
    for name in names {
        let spec = &servers[name];
        let key_base = format!("mcp_servers.{}", sanitize_name(name));
        match spec {
            McpServerSpec::Stdio {
                command,
                args,
                env: server_env,
                cwd: _,
            } => {
                overrides.push(format!("{key_base}.type={}", quoted("stdio")));
                overrides.push(format!("{key_base}.command={}", quoted(command)));
                if !args.is_empty() {
                    let rendered = args.iter().map(|a| quoted(a)).collect::<Vec<_>>().join(", ");
                    overrides.push(format!("{key_base}.args=[{rendered}]"));
                }
                let mut env_keys: Vec<&String> = server_env.keys().collect();
                env_keys.sort();
                for k in env_keys {
                    overrides.push(format!("{key_base}.env.{k}={}", quoted(&server_env[k])));
                }
            }
            McpServerSpec::Http { url, headers } => {
                overrides.push(format!("{key_base}.type={}", quoted("http")));
                overrides.push(format!("{key_base}.url={}", quoted(url)));
                let mut header_names: Vec<&String> = headers.keys().collect();
                header_names.sort();
                for header_name in header_names {
                    let value = &headers[header_name];
                    if header_name.eq_ignore_ascii_case("authorization") {
                        if let Some(token) = strip_bearer_prefix(value) {
                            let var_name = format!(
                                "__HARNESS_MCP_TOKEN_{}",
                                sanitize_name(name).to_uppercase()
                            );
                            overrides.push(format!(
                                "{key_base}.bearer_token_env_var={}",
                                quoted(&var_name)
                            ));
                            env.insert(var_name, token.to_string());
                            continue;
                        }
                    }
                    let header_key = sanitize_name(header_name);
                    overrides.push(format!(
                        "{key_base}.http_headers.{header_key}={}",
                        quoted(value)
                    ));
                }
            }
        }
    }

    (overrides, env)
}
