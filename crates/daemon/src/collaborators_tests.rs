// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use corral_core::{ControlMode, EscalationProtocol, ProjectBrief, SerializedBy, SessionId};

fn agent() -> AgentId {
    AgentId::new("agent-a")
}

fn brief() -> corral_core::AgentBrief {
    corral_core::AgentBrief {
        agent_id: agent(),
        role: "engineer".into(),
        description: "do the thing".into(),
        workstream: "ws-1".into(),
        project: ProjectBrief {
            title: "t".into(),
            description: "d".into(),
            goals: vec![],
            checkpoints: vec![],
        },
        allowed_tools: vec![],
        knowledge_snapshot: Default::default(),
        escalation_protocol: EscalationProtocol {
            mode: "always_ask".into(),
            details: Default::default(),
        },
        control_mode: ControlMode::Supervised,
        provider_config: None,
    }
}

fn handle() -> AgentHandle {
    AgentHandle {
        id: agent(),
        plugin_name: "rpc".into(),
        status: AgentStatus::Running,
        session_id: SessionId::new("sess-1"),
    }
}

fn artifact() -> ArtifactRecord {
    ArtifactRecord {
        agent_id: agent(),
        id: "art-1".into(),
        name: "report.md".into(),
        kind: "document".into(),
        workstream: "ws-1".into(),
        provenance: Provenance::default(),
    }
}

fn checkpoint(n: u64) -> SerializedAgentState {
    SerializedAgentState {
        agent_id: agent(),
        plugin_name: "rpc".into(),
        session_id: SessionId::new("sess-1"),
        checkpoint: serde_json::json!({ "n": n }),
        brief_snapshot: brief(),
        conversation_summary: None,
        pending_decision_ids: vec![],
        last_sequence: n as i64,
        serialized_at_ms: n as i64,
        serialized_by: SerializedBy::DecisionCheckpoint,
        estimated_size_bytes: 10,
    }
}

#[tokio::test]
async fn in_memory_store_registers_and_removes_agents() {
    let store = InMemoryKnowledgeStore::new();
    store.register_agent(&handle()).await;
    assert_eq!(store.agent_status(&agent()), Some(AgentStatus::Running));

    store.remove_agent(&agent()).await;
    assert_eq!(store.agent_status(&agent()), None);
}

#[tokio::test]
async fn in_memory_store_evicts_oldest_checkpoint_past_the_cap() {
    let store = InMemoryKnowledgeStore::new();
    for n in 0..5 {
        store.store_checkpoint(&agent(), checkpoint(n)).await;
    }
    let kept = store.checkpoints(&agent());
    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0].last_sequence, 2);
    assert_eq!(kept[2].last_sequence, 4);
}

#[tokio::test]
async fn in_memory_store_tracks_artifacts_and_coherence_issues() {
    let store = InMemoryKnowledgeStore::new();
    store.store_artifact(artifact()).await;
    assert_eq!(store.artifacts().len(), 1);

    let issue = CoherenceIssue {
        id: "issue-1".into(),
        severity: corral_core::Severity::Medium,
        category: "contradiction".into(),
        affected_ids: vec!["art-1".into()],
    };
    store.store_coherence_issue(&agent(), issue.clone()).await;
    assert_eq!(store.coherence_issues(&agent()), vec![issue]);
}

#[test]
fn recording_hub_keeps_every_message_in_order() {
    let hub = RecordingWebSocketHub::new();
    hub.broadcast(HubMessage::TrustUpdate {
        agent_id: agent(),
        score: 53,
    });
    hub.broadcast(HubMessage::TrustUpdate {
        agent_id: agent(),
        score: 55,
    });
    assert_eq!(hub.messages().len(), 2);
}

#[test]
fn null_collaborators_accept_everything_silently() {
    let monitor = NullCoherenceMonitor;
    assert!(monitor.review(&artifact()).is_none());

    let hub = NullWebSocketHub;
    hub.broadcast(HubMessage::TrustUpdate {
        agent_id: agent(),
        score: 50,
    });
}
