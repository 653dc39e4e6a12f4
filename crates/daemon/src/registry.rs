// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns each live agent's `AgentHandle` for its lifetime, per spec §3's
//! ownership rule: the registry is the only mutator of a handle's status.

use std::collections::HashMap;

use corral_core::{AgentHandle, AgentId, AgentStatus};
use parking_lot::Mutex;

/// Live-agent directory: one `AgentHandle` per currently-known agent.
#[derive(Default)]
pub struct AgentRegistry {
    handles: Mutex<HashMap<AgentId, AgentHandle>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: AgentHandle) {
        self.handles.lock().insert(handle.id.clone(), handle);
    }

    pub fn remove(&self, agent_id: &AgentId) -> Option<AgentHandle> {
        self.handles.lock().remove(agent_id)
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<AgentHandle> {
        self.handles.lock().get(agent_id).cloned()
    }

    /// Set `agent_id`'s status. A no-op if the agent isn't registered —
    /// late status events for an already-removed agent are expected, not an
    /// error (e.g. a final `lifecycle{crashed}` racing the registry cleanup
    /// it itself triggers).
    pub fn set_status(&self, agent_id: &AgentId, status: AgentStatus) {
        if let Some(handle) = self.handles.lock().get_mut(agent_id) {
            handle.status = status;
        }
    }

    pub fn all(&self) -> Vec<AgentHandle> {
        self.handles.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
