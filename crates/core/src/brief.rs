// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable task specification handed to a sandbox on spawn, and the
//! serialized state a sandbox can be resumed from.

use crate::agent::{AgentId, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single checkpoint milestone in a project brief.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// The project brief embedded in an `AgentBrief`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBrief {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
}

/// How escalations are handled for this agent (e.g. always ask, auto-approve
/// below a risk threshold). Opaque beyond round-tripping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationProtocol {
    pub mode: String,
    #[serde(default)]
    pub details: HashMap<String, serde_json::Value>,
}

/// Degree of autonomy granted to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Autonomous,
    Supervised,
    StepByStep,
}

/// Immutable task specification handed to a sandbox on spawn. Never mutated
/// after spawn — updates flow through a separate partial-overlay operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBrief {
    pub agent_id: AgentId,
    pub role: String,
    pub description: String,
    pub workstream: String,
    pub project: ProjectBrief,
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub knowledge_snapshot: HashMap<String, serde_json::Value>,
    pub escalation_protocol: EscalationProtocol,
    pub control_mode: ControlMode,
    /// Opaque provider-specific configuration, preserved bit-for-bit through
    /// the control plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<serde_json::Value>,
}

/// Partial overlay applied via the "update brief" operation. Every field is
/// optional; absent fields leave the sandbox's current brief untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectBrief>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_protocol: Option<EscalationProtocol>,
}

/// Who produced a `SerializedAgentState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializedBy {
    Pause,
    DecisionCheckpoint,
}

/// A serialized agent state the sandbox can resume from — produced on pause
/// or when a decision blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedAgentState {
    pub agent_id: AgentId,
    pub plugin_name: String,
    pub session_id: SessionId,
    /// SDK-specific checkpoint payload, opaque to the control plane.
    pub checkpoint: serde_json::Value,
    pub brief_snapshot: AgentBrief,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
    #[serde(default)]
    pub pending_decision_ids: Vec<String>,
    pub last_sequence: i64,
    pub serialized_at_ms: i64,
    pub serialized_by: SerializedBy,
    pub estimated_size_bytes: u64,
}

#[cfg(test)]
#[path = "brief_tests.rs"]
mod tests;
