// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn agent() -> AgentId {
    AgentId::new("agent-1")
}

#[test]
fn serializes_with_type_tag() {
    let event = Event::Status {
        agent_id: agent(),
        message: "Analyzing...".to_string(),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "status");
    assert_eq!(json["message"], "Analyzing...");
}

#[test]
fn agent_id_accessor_covers_every_variant() {
    let events = vec![
        Event::Status { agent_id: agent(), message: "x".into() },
        Event::Progress { agent_id: agent(), op_id: "op".into(), percent: 0.5 },
        Event::Completion { agent_id: agent(), outcome: CompletionOutcome::Success, summary: None },
        Event::Lifecycle { agent_id: agent(), action: LifecycleAction::Started, reason: None },
    ];
    for event in events {
        assert_eq!(event.agent_id(), &agent());
    }
}

#[test]
fn unknown_type_tag_fails_to_deserialize() {
    let raw = serde_json::json!({"type": "not_a_real_event", "agent_id": "agent-1"});
    let result: Result<Event, _> = serde_json::from_value(raw);
    assert!(result.is_err());
}

#[test]
fn synthetic_backpressure_message_starts_with_literal() {
    let event = Event::synthetic_backpressure(agent());
    match event {
        Event::Error { message, severity, recoverable, category, .. } => {
            assert!(message.starts_with("backpressure"));
            assert!(message.contains("agent-1"));
            assert_eq!(severity, Severity::Warning);
            assert!(recoverable);
            assert_eq!(category, "internal");
        }
        _ => panic!("expected error event"),
    }
}

#[test]
fn synthetic_quarantine_message_contains_issues_joined() {
    let event = Event::synthetic_quarantine_warning(
        agent(),
        &["missing field x".to_string(), "bad type y".to_string()],
    );
    match event {
        Event::Error { message, .. } => {
            assert!(message.starts_with("Malformed adapter event quarantined"));
            assert!(message.contains("missing field x; bad type y"));
        }
        _ => panic!("expected error event"),
    }
}

#[test]
fn synthetic_crash_pair_shares_semantics() {
    let err = Event::synthetic_crash_error(agent(), Some(1), None);
    let lifecycle = Event::synthetic_crash_lifecycle(agent(), Some(1), None);
    match err {
        Event::Error { severity, recoverable, category, message, .. } => {
            assert_eq!(severity, Severity::Critical);
            assert!(!recoverable);
            assert_eq!(category, "internal");
            assert!(message.contains("code=1"));
        }
        _ => panic!("expected error event"),
    }
    match lifecycle {
        Event::Lifecycle { action, reason, .. } => {
            assert_eq!(action, LifecycleAction::Crashed);
            assert!(reason.unwrap().contains("code=1"));
        }
        _ => panic!("expected lifecycle event"),
    }
}

#[test]
fn synthetic_run_prefixes_match_spec() {
    assert!(synthetic_run::crash("a", 1).as_str().starts_with("crash-"));
    assert!(synthetic_run::quarantine("a", 1).as_str().starts_with("quarantine-"));
    assert!(synthetic_run::coherence("a", 1).as_str().starts_with("coherence-"));
}
