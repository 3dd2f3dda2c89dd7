//! Line parser and exit hook for the Claude-family adapter (§4.2, §4.5).

use std::sync::{Arc, Mutex};
use std::time::Instant;

use harness_core::{ErrorCode, Event, ExitHook, LineParser, Usage};
use serde_json::Value;

const KNOWN_TOP_LEVEL_TAGS: &[&str] = &[
    "system",
    "assistant",
    "user",
    "result",
    "tool_progress",
    "tool_use_summary",
    "auth_status",
];
const KNOWN_SYSTEM_SUBTYPES: &[&str] = &[
    "init",
    "status",
    "compact_boundary",
    "hook_started",
    "hook_progress",
    "hook_response",
    "task_notification",
    "files_persisted",
];

fn parse_result_usage(value: &Value) -> Usage {
    let usage_obj = value.get("usage");
    Usage {
        input_tokens: usage_obj
            .and_then(|u| u.get("input_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        output_tokens: usage_obj
            .and_then(|u| u.get("output_tokens"))
            .and_then(Value::as_u64)
            .unwrap_or(0),
        cache_read_tokens: usage_obj
            .and_then(|u| u.get("cache_read_input_tokens"))
            .and_then(Value::as_u64),
        cache_write_tokens: usage_obj
            .and_then(|u| u.get("cache_creation_input_tokens"))
            .and_then(Value::as_u64),
        cost_usd: value.get("total_cost_usd").and_then(Value::as_f64),
        duration_ms: value.get("duration_ms").and_then(Value::as_u64),
    }
}

/// Builds the line parser and exit hook for one invocation. The two share a
/// usage latch: the parser stashes `result`'s usage, the exit hook reads it
/// back to synthesize `Complete`.
#[must_use]
pub fn build_event_handlers() -> (LineParser, Option<ExitHook>) {
    let start = Instant::now();
    let usage_latch: Arc<Mutex<Option<Usage>>> = Arc::new(Mutex::new(None));

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
        let subtype = value.get("subtype").and_then(Value::as_str);
        if tag == "system" {
            match subtype {
                Some(s) if KNOWN_SYSTEM_SUBTYPES.contains(&s) => {}
                _ => return vec![],
            }
        }

        let mut events = Vec::new();
        if tag == "system" && subtype == Some("init") {
            if let Some(session_id) = value.get("session_id").and_then(Value::as_str) {
                events.push(Event::SessionStarted {
                    session_id: session_id.to_string(),
                });
            }
        }

        if tag == "result" {
            let usage = parse_result_usage(&value);
            if let Ok(mut latched) = parser_latch.lock() {
                *latched = Some(usage);
            }
            if value.get("is_error").and_then(Value::as_bool) == Some(true) {
                let message = value
                    .get("result")
                    .and_then(Value::as_str)
                    .unwrap_or("claude reported an error")
                    .to_string();
                events.push(Event::Error {
                    error: message,
                    code: ErrorCode::Unknown,
                });
            }
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

    #[test]
    fn unknown_top_level_tag_is_dropped() {
        let (parser, _) = build_event_handlers();
        assert!(parser(r#"{"type":"not_a_real_tag"}"#).is_empty());
    }

    #[test]
    fn unknown_system_subtype_is_dropped() {
        let (parser, _) = build_event_handlers();
        assert!(parser(r#"{"type":"system","subtype":"not_a_real_subtype"}"#).is_empty());
    }

    #[test]
    fn non_object_and_missing_type_are_dropped() {
        let (parser, _) = build_event_handlers();
        assert!(parser("not json").is_empty());
        assert!(parser("42").is_empty());
        assert!(parser(r#"{"no_type_field":true}"#).is_empty());
    }

    #[test]
    fn system_init_emits_session_started_then_message() {
        let (parser, _) = build_event_handlers();
        let events = parser(r#"{"type":"system","subtype":"init","session_id":"s1"}"#);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            Event::SessionStarted { session_id } if session_id == "s1"
        ));
        assert!(matches!(&events[1], Event::Message { .. }));
    }

    #[test]
    fn unknown_fields_are_preserved_on_recognized_events() {
        let (parser, _) = build_event_handlers();
        let events = parser(r#"{"type":"assistant","some_future_field":42}"#);
        assert_eq!(events.len(), 1);
        if let Event::Message { message } = &events[0] {
            assert_eq!(message["some_future_field"], 42);
        } else {
            panic!("expected message event");
        }
    }

    #[test]
    fn result_latches_usage_for_exit_hook() {
        let (parser, hook) = build_event_handlers();
        let hook = hook.expect("claude adapter always supplies an exit hook");
        let _ = parser(
            r#"{"type":"result","is_error":false,"duration_ms":5000,"total_cost_usd":0.05,
                "usage":{"input_tokens":10,"output_tokens":20}}"#,
        );
        let events = hook(Some(0), "");
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Complete { usage: Some(usage) } => {
                assert_eq!(usage.input_tokens, 10);
                assert_eq!(usage.output_tokens, 20);
                assert_eq!(usage.cost_usd, Some(0.05));
                assert_eq!(usage.duration_ms, Some(5000));
            }
            other => panic!("expected complete with usage, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_exit_without_usage_yields_process_crashed() {
        let (_, hook) = build_event_handlers();
        let hook = hook.expect("claude adapter always supplies an exit hook");
        let events = hook(Some(17), "disk full");
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            Event::Error { code: ErrorCode::ProcessCrashed, error } if error == "disk full"
        ));
    }
}
