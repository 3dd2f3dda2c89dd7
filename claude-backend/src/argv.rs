//! Pure argv/env construction for the Claude-family CLI (§4.2).

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use harness_core::{PermissionMode, Query, ThinkingLevel};

use crate::error::ClaudeError;
use crate::mcp;

/// Default `--setting-sources` value: load user, project, and local config.
pub const DEFAULT_SETTING_SOURCES: &str = "user,project,local";

const READ_ONLY_ALLOWED_TOOLS: &[&str] = &[
    "Read",
    "Glob",
    "Grep",
    "WebSearch",
    "WebFetch",
    "Bash(git status *)",
    "Bash(git log *)",
    "Bash(git diff *)",
    "Bash(ls *)",
    "Bash(gh api *)",
];
const READ_ONLY_DISALLOWED_TOOLS: &[&str] = &["Edit", "Write", "NotebookEdit"];
const PLANNING_TOOLS: &[&str] = &[
    "EnterPlanMode",
    "ExitPlanMode",
    "Task(Plan)",
    "AskUserQuestion",
];

/// Adapter-level configuration, set once when the backend is constructed
/// (not carried on [`Query`], which has no slot for these).
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Value passed to `--setting-sources`.
    pub setting_sources: String,
    /// Appends the planning-tool names to the disallowed list.
    pub disable_planning_tools: bool,
    /// Sets `DISABLE_TELEMETRY=1` / `DISABLE_ERROR_REPORTING=1`.
    pub disable_telemetry: bool,
    /// When a model is present, pins every subagent model env var to it.
    pub force_subagent_model: bool,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            setting_sources: DEFAULT_SETTING_SOURCES.to_string(),
            disable_planning_tools: false,
            disable_telemetry: true,
            force_subagent_model: false,
        }
    }
}

/// The result of building one invocation's argv/env/cwd.
pub struct BuiltArgv {
    /// The full argument list, including the positional prompt.
    pub args: Vec<OsString>,
    /// Environment overlay to merge onto the inherited environment.
    pub env: HashMap<String, String>,
    /// Working directory.
    pub cwd: PathBuf,
    /// Paths to delete once the child has exited.
    pub cleanup_paths: Vec<PathBuf>,
}

fn thinking_flags(level: ThinkingLevel) -> (&'static str, &'static str) {
    match level {
        ThinkingLevel::Low => ("low", "3000"),
        ThinkingLevel::Med => ("medium", "5000"),
        ThinkingLevel::High => ("high", "10000"),
    }
}

/// Builds the argv, environment overlay, and cleanup list for `query`.
///
/// # Errors
/// Returns [`ClaudeError::JsonParseError`] or [`ClaudeError::InvalidConfig`]
/// if the MCP server map cannot be projected to a config file.
pub fn build_args(query: &Query, options: &AdapterOptions) -> Result<BuiltArgv, ClaudeError> {
    let mut args: Vec<OsString> = Vec::new();
    let mut cleanup_paths = Vec::new();
    let mut env = HashMap::new();

    args.push("--output-format".into());
    args.push("stream-json".into());
    args.push("--verbose".into());
    args.push("--setting-sources".into());
    args.push(options.setting_sources.clone().into());

    let mut allowed: Vec<String> = query.allowed_tools.clone();
    let mut disallowed: Vec<String> = query.disallowed_tools.clone();

    match query.mode {
        PermissionMode::Yolo => args.push("--dangerously-skip-permissions".into()),
        PermissionMode::ReadOnly => {
            args.push("--permission-mode".into());
            args.push("dontAsk".into());
            allowed.extend(READ_ONLY_ALLOWED_TOOLS.iter().map(|s| (*s).to_string()));
            disallowed.extend(READ_ONLY_DISALLOWED_TOOLS.iter().map(|s| (*s).to_string()));
        }
    }
    if options.disable_planning_tools {
        disallowed.extend(PLANNING_TOOLS.iter().map(|s| (*s).to_string()));
    }
    if !allowed.is_empty() {
        args.push("--allowedTools".into());
        args.push(allowed.join(", ").into());
    }
    if !disallowed.is_empty() {
        args.push("--disallowed-tools".into());
        args.push(disallowed.join(", ").into());
    }

    if let Some(model) = &query.model {
        args.push("--model".into());
        args.push(model.clone().into());
    }

    if let Some(thinking) = query.thinking {
        let (effort, max_tokens) = thinking_flags(thinking);
        args.push("--effort".into());
        args.push(effort.into());
        args.push("--max-thinking-tokens".into());
        args.push(max_tokens.into());
    }

    if let Some(session_id) = &query.resume_session_id {
        args.push("--resume".into());
        args.push(session_id.clone().into());
        if query.fork_session {
            args.push("--fork-session".into());
        }
    }

    for dir in &query.additional_directories {
        args.push("--add-dir".into());
        args.push(dir.clone().into());
    }

    if let Some(system_prompt) = &query.system_prompt {
        args.push("--system-prompt".into());
        args.push(system_prompt.clone().into());
    }
    if let Some(append) = &query.append_system_prompt {
        args.push("--append-system-prompt".into());
        args.push(append.clone().into());
    }

    if !query.mcp_servers.is_empty() {
        let config_path = mcp::write_mcp_config(&query.mcp_servers)?;
        args.push("--mcp-config".into());
        args.push(config_path.clone().into());
        cleanup_paths.push(config_path);
    }

    if options.disable_telemetry {
        env.insert("DISABLE_TELEMETRY".to_string(), "1".to_string());
        env.insert("DISABLE_ERROR_REPORTING".to_string(), "1".to_string());
    }
    if options.force_subagent_model {
        if let Some(model) = &query.model {
            for var in [
                "ANTHROPIC_DEFAULT_OPUS_MODEL",
                "ANTHROPIC_DEFAULT_SONNET_MODEL",
                "ANTHROPIC_DEFAULT_HAIKU_MODEL",
                "CLAUDE_CODE_SUBAGENT_MODEL",
            ] {
                env.insert(var.to_string(), model.clone());
            }
        }
    }
    for (k, v) in &query.env {
        env.insert(k.clone(), v.clone());
    }

    args.push(query.prompt.join_text().into());

    Ok(BuiltArgv {
        args,
        env,
        cwd: query.cwd.clone(),
        cleanup_paths,
    })
}
