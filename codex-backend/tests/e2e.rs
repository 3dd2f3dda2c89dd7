//! End-to-end resume-path test against a stub child script standing in
//! for the Codex CLI (spec scenario E2).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use codex_backend::{CodexBackend, BACKEND_ID};
use futures::StreamExt;
use harness_core::{Event, PermissionMode, Prompt, Query, Registry, ThinkingLevel};
use tokio_util::sync::CancellationToken;

const STUB_SCRIPT: &str = r#"printf '%s\n' \
  '{"type":"thread.started","thread_id":"t1"}' \
  '{"type":"turn.completed","usage":{"input_tokens":10,"output_tokens":5,"cached_input_tokens":2}}'
"#;

fn query() -> Query {
    Query {
        prompt: Prompt::Text("go".to_string()),
        system_prompt: None,
        append_system_prompt: None,
        cwd: std::env::temp_dir(),
        additional_directories: vec![],
        env: HashMap::new(),
        model: Some("o3".to_string()),
        thinking: Some(ThinkingLevel::High),
        resume_session_id: Some("t1".to_string()),
        fork_session: false,
        mode: PermissionMode::ReadOnly,
        allowed_tools: vec![],
        disallowed_tools: vec![],
        mcp_servers: HashMap::new(),
        client_tools: vec![],
        signal: CancellationToken::new(),
    }
}

#[tokio::test]
async fn e2_resume_argv_suppresses_exec_flags() {
    let backend = CodexBackend::new(PathBuf::from("/usr/bin/true"));
    let invocation = harness_core::Backend::build_invocation(&backend, &query())
        .expect("building the invocation succeeds");
    let args: Vec<String> = invocation
        .process
        .args
        .iter()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    let exec_idx = args.iter().position(|a| a == "exec").expect("exec present");
    assert_eq!(&args[exec_idx..], ["exec", "resume", "--json", "t1", "go"]);
}

#[tokio::test]
async fn e2_resume_stub_transcript_yields_session_started_and_complete() {
    let mut registry = Registry::new();
    registry
        .register(Arc::new(CodexBackend::new(PathBuf::from("/bin/sh"))))
        .expect("first registration succeeds");
    let query = query();

    let (parser, hook) = registry
        .get(BACKEND_ID)
        .expect("backend registered")
        .event_handlers(&query);
    let stub_process = harness_core::ProcessSpec {
        program: PathBuf::from("/bin/sh"),
        args: vec!["-c".into(), STUB_SCRIPT.into()],
        cwd: Some(query.cwd.clone()),
        env: HashMap::new(),
    };
    let events: Vec<Event> = Box::pin(harness_core::streamer::stream(
        stub_process,
        query.signal.clone(),
        parser,
        hook,
    ))
    .collect()
    .await;

    assert!(matches!(&events[0], Event::SessionStarted { session_id } if session_id == "t1"));
    let message_count = events
        .iter()
        .filter(|e| matches!(e, Event::Message { .. }))
        .count();
    assert_eq!(message_count, 2);
    match events.last() {
        Some(Event::Complete { usage: Some(usage) }) => {
            assert_eq!(usage.input_tokens, 10);
            assert_eq!(usage.output_tokens, 5);
            assert_eq!(usage.cache_read_tokens, Some(2));
        }
        other => panic!("expected terminal complete event with usage, got {other:?}"),
    }
}
