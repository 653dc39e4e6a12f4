// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trait boundaries for the daemon's external collaborators: durable
//! storage, coherence review, and the UI WebSocket fan-out. None of these
//! have a production backend in this crate — persistence, the coherence
//! model, and the WS transport are out of scope here and live elsewhere.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use corral_core::{
    AgentHandle, AgentId, AgentStatus, Event, Provenance, Routing, SerializedAgentState, Severity,
};
use parking_lot::Mutex;

/// A stored artifact, built from an `Event::Artifact`'s fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRecord {
    pub agent_id: AgentId,
    pub id: String,
    pub name: String,
    pub kind: String,
    pub workstream: String,
    pub provenance: Provenance,
}

/// A coherence issue raised by reviewing an artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceIssue {
    pub id: String,
    pub severity: Severity,
    pub category: String,
    pub affected_ids: Vec<String>,
}

/// Artifact/checkpoint/coherence/agent bookkeeping. No production backend
/// is implemented here; a real one would persist to disk or a database.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn register_agent(&self, handle: &AgentHandle);
    async fn remove_agent(&self, agent_id: &AgentId);
    async fn store_artifact(&self, artifact: ArtifactRecord);
    async fn store_checkpoint(&self, agent_id: &AgentId, state: SerializedAgentState);
    async fn store_coherence_issue(&self, agent_id: &AgentId, issue: CoherenceIssue);
}

/// Reviews a freshly stored artifact for coherence problems. Fast and
/// synchronous — a production implementation's embedding/review pipeline is
/// out of scope here.
pub trait CoherenceMonitor: Send + Sync {
    fn review(&self, artifact: &ArtifactRecord) -> Option<CoherenceIssue>;
}

/// What gets pushed out to connected UI clients.
#[derive(Debug, Clone)]
pub enum HubMessage {
    Event { event: Event, routing: Routing },
    TrustUpdate { agent_id: AgentId, score: i32 },
}

/// Fan-out sink for UI-bound messages. The real WebSocket transport is out
/// of scope here.
pub trait WebSocketHub: Send + Sync {
    fn broadcast(&self, message: HubMessage);
}

/// Discards everything. The default when no storage backend is wired up.
#[derive(Debug, Default)]
pub struct NullKnowledgeStore;

#[async_trait]
impl KnowledgeStore for NullKnowledgeStore {
    async fn register_agent(&self, _handle: &AgentHandle) {}
    async fn remove_agent(&self, _agent_id: &AgentId) {}
    async fn store_artifact(&self, _artifact: ArtifactRecord) {}
    async fn store_checkpoint(&self, _agent_id: &AgentId, _state: SerializedAgentState) {}
    async fn store_coherence_issue(&self, _agent_id: &AgentId, _issue: CoherenceIssue) {}
}

/// Never finds anything wrong. Useful wherever a monitor is required but
/// coherence review isn't under test.
#[derive(Debug, Default)]
pub struct NullCoherenceMonitor;

impl CoherenceMonitor for NullCoherenceMonitor {
    fn review(&self, _artifact: &ArtifactRecord) -> Option<CoherenceIssue> {
        None
    }
}

/// Drops every message. Useful wherever a hub is required but no UI is
/// under test.
#[derive(Debug, Default)]
pub struct NullWebSocketHub;

impl WebSocketHub for NullWebSocketHub {
    fn broadcast(&self, _message: HubMessage) {}
}

#[derive(Default)]
struct InMemoryState {
    agents: HashMap<AgentId, AgentStatus>,
    artifacts: Vec<ArtifactRecord>,
    checkpoints: HashMap<AgentId, Vec<SerializedAgentState>>,
    coherence_issues: HashMap<AgentId, Vec<CoherenceIssue>>,
}

/// How many checkpoints are retained per agent before the oldest is
/// evicted, per spec §4.12's decision handler.
const MAX_CHECKPOINTS_PER_AGENT: usize = 3;

/// In-memory `KnowledgeStore`, mainly for tests and local development —
/// nothing here survives a restart.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_status(&self, agent_id: &AgentId) -> Option<AgentStatus> {
        self.state.lock().agents.get(agent_id).copied()
    }

    pub fn artifacts(&self) -> Vec<ArtifactRecord> {
        self.state.lock().artifacts.clone()
    }

    pub fn checkpoints(&self, agent_id: &AgentId) -> Vec<SerializedAgentState> {
        self.state
            .lock()
            .checkpoints
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn coherence_issues(&self, agent_id: &AgentId) -> Vec<CoherenceIssue> {
        self.state
            .lock()
            .coherence_issues
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_status(&self, agent_id: &AgentId, status: AgentStatus) {
        if let Some(entry) = self.state.lock().agents.get_mut(agent_id) {
            *entry = status;
        }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn register_agent(&self, handle: &AgentHandle) {
        self.state.lock().agents.insert(handle.id.clone(), handle.status);
    }

    async fn remove_agent(&self, agent_id: &AgentId) {
        let mut state = self.state.lock();
        state.agents.remove(agent_id);
        state.checkpoints.remove(agent_id);
    }

    async fn store_artifact(&self, artifact: ArtifactRecord) {
        self.state.lock().artifacts.push(artifact);
    }

    async fn store_checkpoint(&self, agent_id: &AgentId, state: SerializedAgentState) {
        let mut guard = self.state.lock();
        let entries = guard.checkpoints.entry(agent_id.clone()).or_default();
        entries.push(state);
        while entries.len() > MAX_CHECKPOINTS_PER_AGENT {
            entries.remove(0);
        }
    }

    async fn store_coherence_issue(&self, agent_id: &AgentId, issue: CoherenceIssue) {
        self.state
            .lock()
            .coherence_issues
            .entry(agent_id.clone())
            .or_default()
            .push(issue);
    }
}

/// Records every broadcast message for assertions in tests.
#[derive(Default)]
pub struct RecordingWebSocketHub {
    messages: Mutex<Vec<HubMessage>>,
}

impl RecordingWebSocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<HubMessage> {
        self.messages.lock().clone()
    }
}

impl WebSocketHub for RecordingWebSocketHub {
    fn broadcast(&self, message: HubMessage) {
        self.messages.lock().push(message);
    }
}

/// Convenience alias for the trio of collaborators the pipeline depends on.
pub struct Collaborators {
    pub knowledge_store: Arc<dyn KnowledgeStore>,
    pub coherence_monitor: Arc<dyn CoherenceMonitor>,
    pub hub: Arc<dyn WebSocketHub>,
}

#[cfg(test)]
#[path = "collaborators_tests.rs"]
mod tests;
