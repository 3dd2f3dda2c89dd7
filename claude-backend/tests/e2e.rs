//! End-to-end happy-path test against a stub child script standing in for
//! the Claude CLI (spec scenario E1).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use claude_backend::{AdapterOptions, ClaudeBackend, BACKEND_ID};
use futures::StreamExt;
use harness_core::{Event, PermissionMode, ProcessSpec, Prompt, Query, Registry};
use tokio_util::sync::CancellationToken;

/// A `/bin/sh` stub standing in for the Claude CLI: emits a fixed JSONL
/// transcript and exits 0, ignoring whatever argv it is given.
const STUB_SCRIPT: &str = r#"printf '%s\n' \
  '{"type":"system","subtype":"init","session_id":"s1"}' \
  '{"type":"assistant","message":{"content":[{"type":"text","text":"hello"}]}}' \
  '{"type":"result","is_error":false,"duration_ms":5000,"total_cost_usd":0.05,"usage":{"input_tokens":10,"output_tokens":3}}'
"#;

fn query() -> Query {
    Query {
        prompt: Prompt::Text("hi".to_string()),
        system_prompt: None,
        append_system_prompt: None,
        cwd: std::env::temp_dir(),
        additional_directories: vec![],
        env: HashMap::new(),
        model: None,
        thinking: None,
        resume_session_id: None,
        fork_session: false,
        mode: PermissionMode::Yolo,
        allowed_tools: vec![],
        disallowed_tools: vec![],
        mcp_servers: HashMap::new(),
        client_tools: vec![],
        signal: CancellationToken::new(),
    }
}

#[tokio::test]
async fn e1_happy_path_emits_session_started_messages_then_complete() {
    let backend = ClaudeBackend::new(PathBuf::from("/bin/sh"), AdapterOptions::default());
    let mut registry = Registry::new();
    registry
        .register(Arc::new(backend))
        .expect("first registration succeeds");
    let query = query();

    // Bypass `build_invocation` (which would spawn the real CLI binary)
    // and drive the streamer directly against a stub `/bin/sh -c <script>`
    // child, exercising exactly the same parser/exit-hook pair the real
    // invocation would use.
    let (parser, hook) = registry
        .get(BACKEND_ID)
        .expect("backend registered")
        .event_handlers(&query);
    let stub_process = ProcessSpec {
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

    assert!(matches!(&events[0], Event::SessionStarted { session_id } if session_id == "s1"));
    let message_count = events
        .iter()
        .filter(|e| matches!(e, Event::Message { .. }))
        .count();
    assert_eq!(message_count, 3);
    match events.last() {
        Some(Event::Complete { usage: Some(usage) }) => {
            assert_eq!(usage.input_tokens, 10);
            assert_eq!(usage.output_tokens, 3);
            assert_eq!(usage.cost_usd, Some(0.05));
        }
        other => panic!("expected terminal complete event with usage, got {other:?}"),
    }
}
