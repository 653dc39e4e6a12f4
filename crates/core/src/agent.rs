// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity and the live handle a registry owns for an agent's
//! lifetime.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a sandboxed agent.
    pub struct AgentId;
}

crate::define_id! {
    /// Identifier for a logical session within an agent's sandbox.
    pub struct SessionId;
}

crate::define_id! {
    /// Identifier for a run — the scope within which `sourceSequence` is
    /// monotone. Synthetic runs are prefixed (`crash-`, `quarantine-`,
    /// `coherence-`).
    pub struct RunId;
}

/// Status of a live agent as tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Paused,
    WaitingOnHuman,
    Completed,
    Error,
}

/// Live identifier for a spawned agent, owned by the agent registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentHandle {
    pub id: AgentId,
    pub plugin_name: String,
    pub status: AgentStatus,
    pub session_id: SessionId,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
