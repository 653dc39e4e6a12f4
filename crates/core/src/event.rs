// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types emitted by a sandbox and carried on the bus.
//!
//! `Event` is a closed, tagged union. Serializes with
//! `{"type": "event_name", ...fields}`; an unrecognized `type` tag is a
//! deserialization error (handled by the validator, not a silent `Custom`
//! fallback — the control plane must know exactly what it is routing).

use crate::agent::{AgentId, RunId};
use crate::decision::DecisionId;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// Phase of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallPhase {
    Requested,
    Running,
    Completed,
}

/// Subtype of a `decision` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSubtype {
    Option,
    ToolApproval,
}

/// Where an artifact's content came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Outcome of a completed agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Success,
    Partial,
    Abandoned,
    MaxTurns,
}

/// Lifecycle transition reported by a sandbox or synthesized by the control
/// plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Started,
    Paused,
    Resumed,
    Killed,
    Crashed,
}

/// A single option offered by an `option`-subtype decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionChoice {
    pub label: String,
    #[serde(default)]
    pub recommended: bool,
}

/// Events that trigger state transitions and UI routing in the control
/// plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "status")]
    Status { agent_id: AgentId, message: String },

    #[serde(rename = "progress")]
    Progress {
        agent_id: AgentId,
        op_id: String,
        percent: f32,
    },

    #[serde(rename = "tool_call")]
    ToolCall {
        agent_id: AgentId,
        tool_call_id: String,
        tool_name: String,
        phase: ToolCallPhase,
        #[serde(default)]
        input: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<serde_json::Value>,
    },

    #[serde(rename = "decision")]
    Decision {
        agent_id: AgentId,
        decision_id: DecisionId,
        subtype: DecisionSubtype,
        context: String,
        #[serde(default)]
        options: Vec<DecisionChoice>,
    },

    #[serde(rename = "artifact")]
    Artifact {
        agent_id: AgentId,
        id: String,
        name: String,
        kind: String,
        workstream: String,
        provenance: Provenance,
    },

    #[serde(rename = "coherence")]
    Coherence {
        agent_id: AgentId,
        id: String,
        severity: Severity,
        category: String,
        affected_ids: Vec<String>,
    },

    #[serde(rename = "completion")]
    Completion {
        agent_id: AgentId,
        outcome: CompletionOutcome,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        agent_id: AgentId,
        severity: Severity,
        recoverable: bool,
        category: String,
        message: String,
    },

    #[serde(rename = "lifecycle")]
    Lifecycle {
        agent_id: AgentId,
        action: LifecycleAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    #[serde(rename = "delegation")]
    Delegation {
        agent_id: AgentId,
        #[serde(default)]
        details: serde_json::Value,
    },

    #[serde(rename = "guardrail")]
    Guardrail {
        agent_id: AgentId,
        tripped: bool,
        #[serde(default)]
        details: serde_json::Value,
    },

    #[serde(rename = "raw_provider")]
    RawProvider {
        agent_id: AgentId,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl Event {
    /// The agent this event concerns — every variant carries one.
    pub fn agent_id(&self) -> &AgentId {
        match self {
            Event::Status { agent_id, .. }
            | Event::Progress { agent_id, .. }
            | Event::ToolCall { agent_id, .. }
            | Event::Decision { agent_id, .. }
            | Event::Artifact { agent_id, .. }
            | Event::Coherence { agent_id, .. }
            | Event::Completion { agent_id, .. }
            | Event::Error { agent_id, .. }
            | Event::Lifecycle { agent_id, .. }
            | Event::Delegation { agent_id, .. }
            | Event::Guardrail { agent_id, .. }
            | Event::RawProvider { agent_id, .. } => agent_id,
        }
    }

    /// The `type` discriminant, as it appears on the wire.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Status { .. } => "status",
            Event::Progress { .. } => "progress",
            Event::ToolCall { .. } => "tool_call",
            Event::Decision { .. } => "decision",
            Event::Artifact { .. } => "artifact",
            Event::Coherence { .. } => "coherence",
            Event::Completion { .. } => "completion",
            Event::Error { .. } => "error",
            Event::Lifecycle { .. } => "lifecycle",
            Event::Delegation { .. } => "delegation",
            Event::Guardrail { .. } => "guardrail",
            Event::RawProvider { .. } => "raw_provider",
        }
    }

    /// Build the synthetic backpressure warning emitted when the bus evicts
    /// an entry for `agent_id`.
    pub fn synthetic_backpressure(agent_id: AgentId) -> Self {
        Event::Error {
            agent_id: agent_id.clone(),
            severity: Severity::Warning,
            recoverable: true,
            category: "internal".to_string(),
            message: format!("backpressure: dropped queued event for agent {agent_id}"),
        }
    }

    /// Build the synthetic quarantine warning emitted when an inbound frame
    /// fails validation.
    pub fn synthetic_quarantine_warning(agent_id: AgentId, issues: &[String]) -> Self {
        Event::Error {
            agent_id,
            severity: Severity::Warning,
            recoverable: true,
            category: "internal".to_string(),
            message: format!(
                "Malformed adapter event quarantined: {}",
                issues.join("; ")
            ),
        }
    }

    /// Build the synthetic non-JSON warning emitted when a stream frame
    /// cannot be parsed at all.
    pub fn synthetic_non_json_warning(agent_id: AgentId, parse_error: &str) -> Self {
        Event::Error {
            agent_id,
            severity: Severity::Warning,
            recoverable: true,
            category: "internal".to_string(),
            message: format!("non-JSON frame received: {parse_error}"),
        }
    }

    /// Build the synthetic crash error emitted when a sandbox process dies
    /// unexpectedly.
    pub fn synthetic_crash_error(agent_id: AgentId, code: Option<i32>, signal: Option<i32>) -> Self {
        Event::Error {
            agent_id,
            severity: Severity::Critical,
            recoverable: false,
            category: "internal".to_string(),
            message: format!(
                "Agent process exited unexpectedly (code={}, signal={})",
                code.map(|c| c.to_string()).unwrap_or_else(|| "none".into()),
                signal.map(|s| s.to_string()).unwrap_or_else(|| "none".into()),
            ),
        }
    }

    /// Build the synthetic `lifecycle{crashed}` companion event.
    pub fn synthetic_crash_lifecycle(agent_id: AgentId, code: Option<i32>, signal: Option<i32>) -> Self {
        Event::Lifecycle {
            agent_id,
            action: LifecycleAction::Crashed,
            reason: Some(format!(
                "process exited unexpectedly (code={}, signal={})",
                code.map(|c| c.to_string()).unwrap_or_else(|| "none".into()),
                signal.map(|s| s.to_string()).unwrap_or_else(|| "none".into()),
            )),
        }
    }
}

/// Synthetic run id prefixes so synthesized events never collide with a real
/// adapter stream.
pub mod synthetic_run {
    use super::RunId;

    pub fn crash(agent_id: &str, epoch_ms: i64) -> RunId {
        RunId::new(format!("crash-{agent_id}-{epoch_ms}"))
    }

    pub fn quarantine(agent_id: &str, epoch_ms: i64) -> RunId {
        RunId::new(format!("quarantine-{agent_id}-{epoch_ms}"))
    }

    pub fn coherence(agent_id: &str, epoch_ms: i64) -> RunId {
        RunId::new(format!("coherence-{agent_id}-{epoch_ms}"))
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
