//! Line parser and exit hook for the Codex-family adapter (§4.3, §4.5).

use std::sync::{Arc, Mutex};
use std::time::Instant;

use harness_core::{ErrorCode, Event, ExitHook, LineParser, Query, Usage};
use serde_json::{json, Value};

const KNOWN_TOP_LEVEL_TAGS: &[&str] = &[
    "thread.started",
    "turn.started",
    "turn.completed",
    "turn.failed",
    "item.started",
    "item.completed",
    "error",
];

/// Builds the line parser and exit hook for one invocation, capturing
/// `query`'s cwd/model/additional-directories so `thread.started` can be
/// re-emitted enriched with that metadata.
#[must_use]
pub fn build_event_handlers(query: &Query) -> (LineParser, Option<ExitHook>) {
    let start = Instant::now();
    let usage_latch: Arc<Mutex<Option<Usage>>> = Arc::new(Mutex::new(None));
    let cwd = query.cwd.clone();
    let model = query.model.clone();
    let additional_directories = query.additional_directories.clone();

    let parser_latch = Arc::clone(&usage_latch);
    let parser: LineParser = Arc::new(move |line: &str| {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            return vec![];
        };
        let Some(tag) = value.get("type").and_then(Value::as_str) else {
            return vec![];
        };
        if !KNOWN_TOP_LEVEL_TAGS.contains(&tag) {
            return vec![];
        }

        if tag == "thread.started" {
            if let Some(thread_id) = value.get("thread_id").and_then(Value::as_str) {
                let enriched = json!({
                    "type": "thread.started",
                    "session_id": thread_id,
                    "cwd": cwd,
                    "model": model,
                    "additional_directories": additional_directories,
                });
                return vec![
                    Event::SessionStarted { session_id: thread_id.to_string() },
                    Event::Message { message: enriched },
                ];
            }
        }

        let mut events = Vec::new();

        if tag == "turn.completed" {
            if let Some(usage_obj) = value.get("usage") {
                let usage = Usage {
                    input_tokens: usage_obj
                        .get("input_tokens")
                        .and_then(Value::as_u64)
                        .unwrap_or(0),
                    output_tokens: usage_obj
                        .get("output_tokens")
                        .and_then(Value::as_u64)
                        .unwrap_or(0),
                    cache_read_tokens: usage_obj.get("cached_input_tokens").and_then(Value::as_u64),
                    cache_write_tokens: None,
                    cost_usd: None,
                    duration_ms: None,
                };
                if let Ok(mut latched) = parser_latch.lock() {
                    *latched = Some(usage);
                }
            }
        }

        if tag == "turn.failed" || tag == "error" {
            let message = value
                .get("message")
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("codex reported an error")
                .to_string();
            events.push(Event::Error {
                error: message,
                code: ErrorCode::Unknown,
            });
        }

        events.push(Event::Message { message: value });
        events
    });

    let hook: ExitHook = Arc::new(move |code, stderr| {
        let latched = usage_latch.lock().ok().and_then(|g| g.clone());
        if code == Some(0) || latched.is_some() {
            let mut usage = latched.unwrap_or_default();
            if usage.duration_ms.is_none() {
                usage.duration_ms = Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
            }
            vec![Event::Complete { usage: Some(usage) }]
        } else {
            let message = if stderr.trim().is_empty() {
                code.map_or_else(
                    || "process terminated by signal".to_string(),
                    |c| format!("exit code {c}"),
                )
            } else {
                stderr.to_string()
            };
            vec![Event::Error {
                error: message,
                code: ErrorCode::ProcessCrashed,
            }]
        }
    });

    (parser, Some(hook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_core::{PermissionMode, Prompt};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tokio_util::sync::CancellationToken;

    fn stub_query() -> Query {
        Query {
            prompt: Prompt::Text("go".to_string()),
            system_prompt: None,
            append_system_prompt: None,
            cwd: PathBuf::from("/tmp"),
            additional_directories: vec![],
            env: HashMap::new(),
            model: Some("o3".to_string()),
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

    #[test]
    fn unknown_tag_is_dropped() {
        let (parser, _) = build_event_handlers(&stub_query());
        assert!(parser(r#"{"type":"something.else"}"#).is_empty());
    }

    #[test]
    fn thread_started_emits_session_started_then_enriched_message() {
        let (parser, _) = build_event_handlers(&stub_query());
        let events = parser(r#"{"type":"thread.started","thread_id":"t1"}"#);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Event::SessionStarted { session_id } if session_id == "t1"
        ));
        if let Event::Message { message } = &events[1] {
            assert_eq!(message["session_id"], "t1");
            assert_eq!(message["model"], "o3");
        } else {
            panic!("expected enriched message");
        }
    }

    #[test]
    fn turn_completed_latches_usage() {
        let (parser, hook) = build_event_handlers(&stub_query());
        let hook = hook.expect("codex adapter always supplies an exit hook");
        let _ = parser(
            r#"{"type":"turn.completed","usage":{"input_tokens":10,"output_tokens":5,"cached_input_tokens":2}}"#,
        );
        let events = hook(Some(0), "");
        match &events[0] {
            Event::Complete { usage: Some(usage) } => {
                assert_eq!(usage.input_tokens, 10);
                assert_eq!(usage.output_tokens, 5);
                assert_eq!(usage.cache_read_tokens, Some(2));
            }
            other => panic!("expected complete with usage, got {other:?}"),
        }
    }

    #[test]
    fn turn_failed_maps_to_unknown_error_plus_message() {
        let (parser, _) = build_event_handlers(&stub_query());
        let events = parser(r#"{"type":"turn.failed","message":"boom"}"#);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Event::Error { code: ErrorCode::Unknown, error } if error == "boom"
        ));
        assert!(matches!(&events[1], Event::Message { .. }));
    }
}
