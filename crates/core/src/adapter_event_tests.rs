// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::AgentId;

#[test]
fn synthetic_event_uses_sentinel_sequence() {
    let event = Event::Status {
        agent_id: AgentId::new("agent-1"),
        message: "hi".to_string(),
    };
    let adapter_event = AdapterEvent::synthetic(RunId::new("crash-agent-1-1"), event, 1_000);
    assert_eq!(adapter_event.source_sequence, SYNTHETIC_SEQUENCE);
    assert!(adapter_event.is_synthetic());
}

#[test]
fn envelope_exposes_inner_event() {
    let event = Event::Status {
        agent_id: AgentId::new("agent-1"),
        message: "hi".to_string(),
    };
    let adapter_event = AdapterEvent {
        source_event_id: "ev-1".to_string(),
        source_sequence: 0,
        source_occurred_at_ms: 0,
        run_id: RunId::new("run-1"),
        event,
    };
    let envelope = EventEnvelope::new(adapter_event, 1_500);
    assert_eq!(envelope.ingested_at_ms, 1_500);
    assert_eq!(envelope.event().type_name(), "status");
}
