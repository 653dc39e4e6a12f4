// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn valid_frame() -> String {
    serde_json::json!({
        "source_event_id": "ev-1",
        "source_sequence": 0,
        "source_occurred_at_ms": 1_000,
        "run_id": "run-1",
        "event": {
            "type": "status",
            "agent_id": "agent-a",
            "message": "hi"
        }
    })
    .to_string()
}

#[test]
fn well_formed_frame_parses() {
    let result = validate_adapter_event(&valid_frame());
    assert!(result.is_ok());
}

#[test]
fn unknown_event_type_is_quarantined() {
    let raw = serde_json::json!({
        "source_event_id": "ev-1",
        "source_sequence": 0,
        "source_occurred_at_ms": 1_000,
        "run_id": "run-1",
        "event": {
            "type": "not_a_real_type",
            "agent_id": "agent-a"
        }
    })
    .to_string();

    let err = validate_adapter_event(&raw).unwrap_err();
    assert_eq!(err.issues.len(), 1);
    assert_eq!(err.raw, raw);
}

#[test]
fn non_json_frame_is_quarantined() {
    let err = validate_adapter_event("not json at all").unwrap_err();
    assert_eq!(err.issues.len(), 1);
}

#[test]
fn negative_sequence_is_quarantined() {
    let raw = serde_json::json!({
        "source_event_id": "ev-1",
        "source_sequence": -5,
        "source_occurred_at_ms": 1_000,
        "run_id": "run-1",
        "event": {
            "type": "status",
            "agent_id": "agent-a",
            "message": "hi"
        }
    })
    .to_string();

    let err = validate_adapter_event(&raw).unwrap_err();
    assert!(err.issues[0].contains("source_sequence"));
}

#[test]
fn quarantine_ring_evicts_oldest_beyond_capacity() {
    let ring = QuarantineRing::new(2);
    ring.quarantine(ValidationFailure {
        issues: vec!["a".into()],
        raw: "1".into(),
    });
    ring.quarantine(ValidationFailure {
        issues: vec!["b".into()],
        raw: "2".into(),
    });
    ring.quarantine(ValidationFailure {
        issues: vec!["c".into()],
        raw: "3".into(),
    });

    let entries = ring.list();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].raw, "2");
    assert_eq!(entries[1].raw, "3");
}

#[test]
fn clear_empties_the_ring() {
    let ring = QuarantineRing::new(5);
    ring.quarantine(ValidationFailure {
        issues: vec!["a".into()],
        raw: "1".into(),
    });
    ring.clear();
    assert!(ring.is_empty());
}
