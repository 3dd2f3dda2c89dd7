//! Pure positional argv/env construction for the Codex-family CLI (§4.3).

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use harness_core::{PermissionMode, Query, ThinkingLevel};

use crate::mcp;

/// The result of building one invocation's argv/env/cwd.
pub struct BuiltArgv {
    /// The full positional argument list.
    pub args: Vec<OsString>,
    /// Environment overlay to merge onto the inherited environment.
    pub env: HashMap<String, String>,
    /// Working directory.
    pub cwd: PathBuf,
}

fn reasoning_effort(level: ThinkingLevel) -> &'static str {
    match level {
        ThinkingLevel::Low => "low",
        ThinkingLevel::Med => "medium",
        ThinkingLevel::High => "xhigh",
    }
}

fn wrapped_prompt(query: &Query) -> String {
    let prompt = query.prompt.join_text();
    let system = query.system_prompt.as_ref().or(query.append_system_prompt.as_ref());
    match system {
        Some(text) => format!("<system-instructions>\n{text}\n</system-instructions>\n\n{prompt}"),
        None => prompt,
    }
}

/// Builds the positional argv, environment overlay, and cwd for `query`.
///
/// `allowedTools`/`disallowedTools` are ignored (Codex has no named-tool
/// concept); `forkSession` is ignored with a warning logged.
#[must_use]
pub fn build_args(query: &Query) -> BuiltArgv {
    let mut args: Vec<OsString> = Vec::new();
    let mut env = HashMap::new();

    match query.mode {
        PermissionMode::ReadOnly => {
            args.push("-a".into());
            args.push("on-request".into());
        }
        PermissionMode::Yolo => args.push("--yolo".into()),
    }

    args.push("exec".into());

    if query.fork_session {
        tracing::warn!("codex adapter does not support forkSession; ignoring");
    }

    let prompt = wrapped_prompt(query);

    if let Some(session_id) = &query.resume_session_id {
        args.push("resume".into());
        args.push("--json".into());
        args.push(session_id.clone().into());
    } else {
        args.push("--json".into());
        if matches!(query.mode, PermissionMode::ReadOnly) {
            args.push("--sandbox".into());
            args.push("read-only".into());
        }
        if let Some(model) = &query.model {
            args.push("-m".into());
            args.push(model.clone().into());
        }
        args.push("-C".into());
        args.push(query.cwd.clone().into());
        for dir in &query.additional_directories {
            args.push("--add-dir".into());
            args.push(dir.clone().into());
        }
        if let Some(thinking) = query.thinking {
            args.push("-c".into());
            args.push(format!("model_reasoning_effort={}", reasoning_effort(thinking)).into());
        }
        if !query.mcp_servers.is_empty() {
            let (overrides, mcp_env) = mcp::project_overrides(&query.mcp_servers);
            for kv in overrides {
                args.push("-c".into());
                args.push(kv.into());
            }
            env.extend(mcp_env);
        }
    }

    for (k, v) in &query.env {
        env.insert(k.clone(), v.clone());
    }

    args.push(prompt.into());

    BuiltArgv {
        args,
        env,
        cwd: query.cwd.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::Prompt;
    use std::path::PathBuf;
    use tokio_util::sync::CancellationToken;

    fn base_query() -> Query {
        Query {
            prompt: Prompt::Text("go".to_string()),
            system_prompt: None,
            append_system_prompt: None,
            cwd: PathBuf::from("/tmp"),
            additional_directories: vec![],
            env: HashMap::new(),
            model: None,
            thinking: None,
            resume_session_id: None,
            fork_session: false,
            mode: PermissionMode::ReadOnly,
            allowed_tools: vec![],
            disallowed_tools: vec![],
            mcp_servers: HashMap::new(),
            client_tools: vec![],
            signal: CancellationToken::new(),
        }
    }

    fn args_str(built: &BuiltArgv) -> Vec<String> {
        built
            .args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn resume_suppresses_exec_level_flags() {
        let mut query = base_query();
        query.resume_session_id = Some("abc".to_string());
        query.model = Some("o3".to_string());
        query.thinking = Some(ThinkingLevel::High);
        query.additional_directories = vec![PathBuf::from("/extra")];
        let built = build_args(&query);
        let args = args_str(&built);

        let exec_idx = args.iter().position(|a| a == "exec").unwrap();
        assert_eq!(
            &args[exec_idx..],
            ["exec", "resume", "--json", "abc", "go"]
        );
        assert!(!args.contains(&"--sandbox".to_string()));
        assert!(!args.contains(&"-m".to_string()));
        assert!(!args.contains(&"-C".to_string()));
        assert!(!args.contains(&"--add-dir".to_string()));
        assert!(!args.contains(&"-c".to_string()));
    }

    #[test]
    fn non_resume_emits_sandbox_model_cwd_and_reasoning_effort() {
        let mut query = base_query();
        query.model = Some("o3".to_string());
        query.thinking = Some(ThinkingLevel::Med);
        let built = build_args(&query);
        let args = args_str(&built);
        assert!(args.windows(2).any(|w| w[0] == "--sandbox" && w[1] == "read-only"));
        assert!(args.windows(2).any(|w| w[0] == "-m" && w[1] == "o3"));
        assert!(args.windows(2).any(|w| w[0] == "-C" && w[1] == "/tmp"));
        assert!(args
            .windows(2)
            .any(|w| w[0] == "-c" && w[1] == "model_reasoning_effort=medium"));
    }

    #[test]
    fn yolo_mode_uses_yolo_root_flag_not_sandbox() {
        let mut query = base_query();
        query.mode = PermissionMode::Yolo;
        let built = build_args(&query);
        let args = args_str(&built);
        assert!(args.contains(&"--yolo".to_string()));
        assert!(!args.contains(&"--sandbox".to_string()));
    }

    #[test]
    fn system_prompt_is_prepended_with_template() {
        let mut query = base_query();
        query.system_prompt = Some("be terse".to_string());
        let built = build_args(&query);
        let prompt = built.args.last().unwrap().to_string_lossy().to_string();
        assert!(prompt.starts_with("<system-instructions>\nbe terse\n</system-instructions>\n\n"));
        assert!(prompt.ends_with("go"));
    }
}
