// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn agent() -> AgentId {
    AgentId::new("agent-a")
}

#[test]
fn new_decision_starts_pending() {
    let queue = DecisionQueue::new(10);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    let all = queue.list_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].state, DecisionState::Pending);
}

#[test]
fn resolve_moves_decision_to_resolved() {
    let queue = DecisionQueue::new(10);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.resolve(&DecisionId::new("d1")).expect("resolve");
    assert!(queue.list_pending().is_empty());
    assert_eq!(queue.list_all()[0].state, DecisionState::Resolved);
}

#[test]
fn resolve_unknown_decision_errors() {
    let queue = DecisionQueue::new(10);
    let err = queue.resolve(&DecisionId::new("missing")).unwrap_err();
    assert_eq!(err, DecisionError::UnknownDecision(DecisionId::new("missing")));
}

#[test]
fn resolve_twice_errors() {
    let queue = DecisionQueue::new(10);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.resolve(&DecisionId::new("d1")).expect("resolve");
    let err = queue.resolve(&DecisionId::new("d1")).unwrap_err();
    assert_eq!(err, DecisionError::AlreadyResolved(DecisionId::new("d1")));
}

#[test]
fn unarmed_pending_decisions_never_age_out() {
    let queue = DecisionQueue::new(5);
    queue.submit(DecisionId::new("d1"), agent(), 10);

    queue.escalate_expired(12);
    queue.escalate_expired(1_000);
    assert_eq!(queue.list_all()[0].state, DecisionState::Pending);
    assert_eq!(queue.list_all()[0].badge, None);
}

#[test]
fn expiring_grace_period_escalates_to_triage() {
    let queue = DecisionQueue::new(5);
    queue.submit(DecisionId::new("d1"), agent(), 10);
    queue.schedule_orphan_triage(&agent(), 10);

    let armed = queue.list_all()[0].clone();
    assert_eq!(armed.badge.as_deref(), Some("grace period"));
    assert_eq!(armed.grace_deadline_tick, Some(15));

    queue.escalate_expired(12);
    assert_eq!(queue.list_all()[0].state, DecisionState::Pending);

    queue.escalate_expired(15);
    let escalated = queue.list_all()[0].clone();
    assert_eq!(escalated.state, DecisionState::Triage);
    assert_eq!(escalated.badge.as_deref(), Some("agent killed"));
    assert_eq!(escalated.priority, DecisionPriority::Raised);
}

#[test]
fn schedule_orphan_triage_does_not_rearm_an_already_armed_entry() {
    let queue = DecisionQueue::new(5);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.schedule_orphan_triage(&agent(), 0);
    queue.schedule_orphan_triage(&agent(), 100);

    assert_eq!(queue.list_all()[0].grace_deadline_tick, Some(5));
}

#[test]
fn killing_the_agent_escalates_its_pending_decisions_immediately() {
    let queue = DecisionQueue::new(1_000);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.submit(DecisionId::new("d2"), AgentId::new("agent-b"), 0);

    queue.handle_agent_killed(&agent());

    let all = queue.list_all();
    let d1 = all.iter().find(|r| r.id == DecisionId::new("d1")).expect("d1");
    let d2 = all.iter().find(|r| r.id == DecisionId::new("d2")).expect("d2");
    assert_eq!(d1.state, DecisionState::Triage);
    assert_eq!(d1.badge.as_deref(), Some("agent killed"));
    assert_eq!(d1.priority, DecisionPriority::Raised);
    assert_eq!(d2.state, DecisionState::Pending);
}

#[test]
fn resolved_decisions_are_never_re_orphaned() {
    let queue = DecisionQueue::new(1);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.resolve(&DecisionId::new("d1")).expect("resolve");

    queue.escalate_expired(1_000);
    queue.handle_agent_killed(&agent());

    assert_eq!(queue.list_all()[0].state, DecisionState::Resolved);
}

#[test]
fn list_pending_excludes_triage_and_resolved() {
    let queue = DecisionQueue::new(5);
    queue.submit(DecisionId::new("d1"), agent(), 0);
    queue.submit(DecisionId::new("d2"), agent(), 0);
    queue.submit(DecisionId::new("d3"), agent(), 0);

    queue.resolve(&DecisionId::new("d1")).expect("resolve");
    queue.handle_agent_killed(&agent());

    // d1 resolved (excluded), d2/d3 were pending then killed -> triage
    // (excluded); list_pending should now be empty.
    assert!(queue.list_pending().is_empty());
}
