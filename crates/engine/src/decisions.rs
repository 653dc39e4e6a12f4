// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision checkpoint state machine, per spec §4.6: a `pending` decision
//! only ever starts aging toward `triage` once `schedule_orphan_triage` has
//! armed its grace deadline — submission alone does not. From there it
//! escalates to `triage` either because that deadline elapsed or because
//! the agent that raised it died, and `resolve()` moves a decision to its
//! terminal `resolved` state. Resolved decisions are immutable — they never
//! re-enter `triage`.

use corral_core::{AgentId, DecisionId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a decision sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionState {
    /// Awaiting a human response.
    Pending,
    /// Escalated: the owning agent was killed, or its grace period elapsed.
    Triage,
    /// Terminal. Never re-evaluated.
    Resolved,
}

/// Queue priority. Raised on escalation to `triage` so downstream views can
/// surface orphaned decisions ahead of ordinary pending ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPriority {
    Normal,
    Raised,
}

/// A tracked decision checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: DecisionId,
    pub agent_id: AgentId,
    pub created_tick: u64,
    pub state: DecisionState,
    pub priority: DecisionPriority,
    /// `"grace period"` while pending with an armed deadline, `"agent
    /// killed"` once escalated to `triage` by either path. `None` until
    /// `schedule_orphan_triage` is called for this entry.
    pub badge: Option<String>,
    /// Set by `schedule_orphan_triage`; `escalate_expired` only acts on
    /// entries that have one.
    pub grace_deadline_tick: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("unknown decision `{0}`")]
    UnknownDecision(DecisionId),
    #[error("decision `{0}` is already resolved")]
    AlreadyResolved(DecisionId),
}

/// Tracks decision checkpoints from submission through resolution.
pub struct DecisionQueue {
    grace_period_ticks: u64,
    records: Mutex<Vec<DecisionRecord>>,
}

impl DecisionQueue {
    pub fn new(grace_period_ticks: u64) -> Self {
        Self {
            grace_period_ticks,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Register a new decision in the `pending` state. Its grace deadline is
    /// unarmed until `schedule_orphan_triage` is called for its agent.
    pub fn submit(&self, id: DecisionId, agent_id: AgentId, created_tick: u64) {
        self.records.lock().push(DecisionRecord {
            id,
            agent_id,
            created_tick,
            state: DecisionState::Pending,
            priority: DecisionPriority::Normal,
            badge: None,
            grace_deadline_tick: None,
        });
    }

    /// Arm the orphan-triage grace deadline for every currently pending,
    /// not-yet-armed decision owned by `agent_id`. `escalate_expired` will
    /// not touch an entry until this has been called for it.
    pub fn schedule_orphan_triage(&self, agent_id: &AgentId, now_tick: u64) {
        let mut records = self.records.lock();
        for record in records.iter_mut() {
            if &record.agent_id == agent_id
                && record.state == DecisionState::Pending
                && record.grace_deadline_tick.is_none()
            {
                record.grace_deadline_tick = Some(now_tick + self.grace_period_ticks);
                record.badge = Some("grace period".to_string());
            }
        }
    }

    /// Mark a decision resolved. Errors if the id is unknown or it was
    /// already resolved.
    pub fn resolve(&self, id: &DecisionId) -> Result<(), DecisionError> {
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| DecisionError::UnknownDecision(id.clone()))?;
        if record.state == DecisionState::Resolved {
            return Err(DecisionError::AlreadyResolved(id.clone()));
        }
        record.state = DecisionState::Resolved;
        Ok(())
    }

    /// Escalate every pending decision owned by `agent_id` to `triage`,
    /// immediately, bypassing the grace period. Resolved decisions for that
    /// agent are left untouched.
    pub fn handle_agent_killed(&self, agent_id: &AgentId) {
        let mut records = self.records.lock();
        for record in records.iter_mut() {
            if &record.agent_id == agent_id && record.state == DecisionState::Pending {
                record.state = DecisionState::Triage;
                record.badge = Some("agent killed".to_string());
                record.priority = DecisionPriority::Raised;
            }
        }
    }

    /// Escalate to `triage` every pending decision whose grace deadline has
    /// been armed (via `schedule_orphan_triage`) and has elapsed as of
    /// `current_tick`. Entries with no armed deadline are left pending
    /// indefinitely — this is the orphan path, not an age cap on all
    /// decisions.
    pub fn escalate_expired(&self, current_tick: u64) {
        let mut records = self.records.lock();
        for record in records.iter_mut() {
            if record.state == DecisionState::Pending {
                if let Some(deadline) = record.grace_deadline_tick {
                    if current_tick >= deadline {
                        record.state = DecisionState::Triage;
                        record.badge = Some("agent killed".to_string());
                        record.priority = DecisionPriority::Raised;
                    }
                }
            }
        }
    }

    /// Decisions still awaiting a human response, in submission order.
    pub fn list_pending(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.state == DecisionState::Pending)
            .cloned()
            .collect()
    }

    /// Every tracked decision, in submission order.
    pub fn list_all(&self) -> Vec<DecisionRecord> {
        self.records.lock().clone()
    }
}

#[cfg(test)]
#[path = "decisions_tests.rs"]
mod tests;
