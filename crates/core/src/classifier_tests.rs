// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::AgentId;
use crate::decision::DecisionId;
use crate::event::{CompletionOutcome, LifecycleAction};
use crate::severity::Severity;

fn agent() -> AgentId {
    AgentId::new("agent-1")
}

#[test]
fn status_routes_to_briefing_only() {
    let event = Event::Status {
        agent_id: agent(),
        message: "hi".into(),
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Briefing);
    assert_eq!(routing.secondary, None);
}

#[test]
fn decision_option_routes_queue_then_briefing() {
    let event = Event::Decision {
        agent_id: agent(),
        decision_id: DecisionId::new("d1"),
        subtype: DecisionSubtype::Option,
        context: "pick one".into(),
        options: vec![],
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Queue);
    assert_eq!(routing.secondary, Some(Workspace::Briefing));
}

#[test]
fn decision_tool_approval_routes_queue_then_controls() {
    let event = Event::Decision {
        agent_id: agent(),
        decision_id: DecisionId::new("d1"),
        subtype: DecisionSubtype::ToolApproval,
        context: "approve?".into(),
        options: vec![],
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Queue);
    assert_eq!(routing.secondary, Some(Workspace::Controls));
}

#[yare::parameterized(
    warning = { Severity::Warning, None },
    low = { Severity::Low, None },
    medium = { Severity::Medium, None },
    high = { Severity::High, Some(Workspace::Queue) },
    critical = { Severity::Critical, Some(Workspace::Queue) },
)]
fn coherence_secondary_depends_on_severity(severity: Severity, expected_secondary: Option<Workspace>) {
    let event = Event::Coherence {
        agent_id: agent(),
        id: "c1".into(),
        severity,
        category: "cat".into(),
        affected_ids: vec![],
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Map);
    assert_eq!(routing.secondary, expected_secondary);
}

#[yare::parameterized(
    warning = { Severity::Warning, Some(Workspace::Briefing) },
    high = { Severity::High, Some(Workspace::Briefing) },
    critical = { Severity::Critical, Some(Workspace::Briefing) },
)]
fn error_always_routes_briefing_secondary_regardless_of_severity(
    severity: Severity,
    expected_secondary: Option<Workspace>,
) {
    // Note: spec says "briefing iff severity >= high"; verify the boundary
    // explicitly below rather than relying on this table alone.
    let event = Event::Error {
        agent_id: agent(),
        severity,
        recoverable: true,
        category: "internal".into(),
        message: "m".into(),
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Controls);
    if severity.is_at_least_high() {
        assert_eq!(routing.secondary, expected_secondary);
    } else {
        assert_eq!(routing.secondary, None);
    }
}

#[test]
fn error_below_high_has_no_secondary() {
    let event = Event::Error {
        agent_id: agent(),
        severity: Severity::Medium,
        recoverable: true,
        category: "internal".into(),
        message: "m".into(),
    };
    assert_eq!(classify(&event).secondary, None);
}

#[test]
fn guardrail_secondary_depends_on_tripped() {
    let tripped = Event::Guardrail {
        agent_id: agent(),
        tripped: true,
        details: serde_json::Value::Null,
    };
    let untripped = Event::Guardrail {
        agent_id: agent(),
        tripped: false,
        details: serde_json::Value::Null,
    };
    assert_eq!(classify(&tripped).secondary, Some(Workspace::Queue));
    assert_eq!(classify(&untripped).secondary, None);
}

#[test]
fn completion_routes_briefing_then_controls() {
    let event = Event::Completion {
        agent_id: agent(),
        outcome: CompletionOutcome::Success,
        summary: None,
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Briefing);
    assert_eq!(routing.secondary, Some(Workspace::Controls));
}

#[test]
fn lifecycle_routes_controls_then_briefing() {
    let event = Event::Lifecycle {
        agent_id: agent(),
        action: LifecycleAction::Started,
        reason: None,
    };
    let routing = classify(&event);
    assert_eq!(routing.primary, Workspace::Controls);
    assert_eq!(routing.secondary, Some(Workspace::Briefing));
}

#[test]
fn classifier_is_pure() {
    let event = Event::Progress {
        agent_id: agent(),
        op_id: "op".into(),
        percent: 50.0,
    };
    assert_eq!(classify(&event), classify(&event));
}
