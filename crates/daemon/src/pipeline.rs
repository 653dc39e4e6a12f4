// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide event wiring, per spec §4.12: one subscriber per concern,
//! each registered on the shared bus. `EventBus::publish` invokes
//! subscriber handlers synchronously on the publisher's call stack, so any
//! handler that needs to do I/O (an RPC call, a knowledge-store write)
//! spawns a task rather than blocking the publisher.

use std::sync::Arc;

use corral_adapters::AggregatingPlugin;
use corral_bus::{EventBus, Filter};
use corral_core::{
    classify, AdapterEvent, AgentId, AgentStatus, Clock, CompletionOutcome, Event, EventEnvelope,
    LifecycleAction, Outcome, Severity, TickService,
};
use corral_engine::{DecisionQueue, TrustEngine};

use crate::collaborators::{ArtifactRecord, Collaborators, HubMessage};
use crate::registry::AgentRegistry;

fn completion_outcome(outcome: CompletionOutcome) -> Outcome {
    match outcome {
        CompletionOutcome::Success => Outcome::TaskCompletedClean,
        CompletionOutcome::Partial => Outcome::TaskCompletedPartial,
        CompletionOutcome::Abandoned | CompletionOutcome::MaxTurns => Outcome::TaskAbandonedOrMaxTurns,
    }
}

/// Wires every bus subscription the daemon depends on. Construction alone
/// does nothing; call `wire()` once to subscribe.
pub struct Pipeline {
    bus: Arc<EventBus>,
    plugin: Arc<AggregatingPlugin>,
    registry: Arc<AgentRegistry>,
    decisions: Arc<DecisionQueue>,
    trust: Arc<TrustEngine>,
    tick_service: Arc<TickService>,
    clock: Arc<dyn Clock>,
    collaborators: Collaborators,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: Arc<EventBus>,
        plugin: Arc<AggregatingPlugin>,
        registry: Arc<AgentRegistry>,
        decisions: Arc<DecisionQueue>,
        trust: Arc<TrustEngine>,
        tick_service: Arc<TickService>,
        clock: Arc<dyn Clock>,
        collaborators: Collaborators,
    ) -> Arc<Self> {
        Arc::new(Self {
            bus,
            plugin,
            registry,
            decisions,
            trust,
            tick_service,
            clock,
            collaborators,
        })
    }

    /// Subscribe every handler to the bus. Idempotent only in the sense
    /// that calling it twice double-subscribes — callers wire exactly once.
    pub fn wire(self: &Arc<Self>) {
        self.wire_fan_out();
        self.wire_decision_handler();
        self.wire_artifact_handler();
        self.wire_lifecycle_handler();
        self.wire_completion_handler();
        self.wire_error_handler();
    }

    fn wire_fan_out(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter::default(),
            Arc::new(move |envelope: &EventEnvelope| {
                let routing = classify(envelope.event());
                this.collaborators.hub.broadcast(HubMessage::Event {
                    event: envelope.event().clone(),
                    routing,
                });
            }),
        );
    }

    fn wire_decision_handler(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter {
                agent_id: None,
                event_type: Some("decision"),
            },
            Arc::new(move |envelope: &EventEnvelope| {
                let Event::Decision {
                    agent_id,
                    decision_id,
                    ..
                } = envelope.event().clone()
                else {
                    return;
                };
                let now_tick = this.tick_service.current_tick();
                this.decisions.submit(decision_id.clone(), agent_id.clone(), now_tick);
                this.decisions.schedule_orphan_triage(&agent_id, now_tick);
                this.registry.set_status(&agent_id, AgentStatus::WaitingOnHuman);

                let this = this.clone();
                tokio::spawn(async move {
                    match this.plugin.request_checkpoint(&agent_id, &decision_id).await {
                        Ok(state) => this.collaborators.knowledge_store.store_checkpoint(&agent_id, state).await,
                        Err(err) => tracing::warn!(
                            %agent_id, %decision_id, error = %err,
                            "failed to request checkpoint for decision"
                        ),
                    }
                });
            }),
        );
    }

    fn wire_artifact_handler(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter {
                agent_id: None,
                event_type: Some("artifact"),
            },
            Arc::new(move |envelope: &EventEnvelope| {
                let Event::Artifact {
                    agent_id,
                    id,
                    name,
                    kind,
                    workstream,
                    provenance,
                } = envelope.event().clone()
                else {
                    return;
                };
                let record = ArtifactRecord {
                    agent_id: agent_id.clone(),
                    id,
                    name,
                    kind,
                    workstream,
                    provenance,
                };

                let this = this.clone();
                tokio::spawn(async move {
                    this.collaborators.knowledge_store.store_artifact(record.clone()).await;

                    if let Some(issue) = this.collaborators.coherence_monitor.review(&record) {
                        this.collaborators
                            .knowledge_store
                            .store_coherence_issue(&agent_id, issue.clone())
                            .await;

                        let now_ms = this.clock.now_ms();
                        let run_id = corral_core::event::synthetic_run::coherence(agent_id.as_str(), now_ms);
                        let coherence_event = Event::Coherence {
                            agent_id,
                            id: issue.id,
                            severity: issue.severity,
                            category: issue.category,
                            affected_ids: issue.affected_ids,
                        };
                        this.bus.publish(EventEnvelope::new(
                            AdapterEvent::synthetic(run_id, coherence_event, now_ms),
                            now_ms,
                        ));
                    }
                });
            }),
        );
    }

    fn wire_lifecycle_handler(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter {
                agent_id: None,
                event_type: Some("lifecycle"),
            },
            Arc::new(move |envelope: &EventEnvelope| {
                let Event::Lifecycle { agent_id, action, .. } = envelope.event().clone() else {
                    return;
                };
                match action {
                    LifecycleAction::Started => {
                        let this = this.clone();
                        tokio::spawn(async move {
                            if let Some(handle) = this.registry.get(&agent_id) {
                                this.collaborators.knowledge_store.register_agent(&handle).await;
                            } else {
                                tracing::warn!(%agent_id, "lifecycle started for an unregistered agent");
                            }
                        });
                    }
                    LifecycleAction::Paused => {
                        this.registry.set_status(&agent_id, AgentStatus::Paused);
                    }
                    LifecycleAction::Resumed => {
                        this.registry.set_status(&agent_id, AgentStatus::Running);
                    }
                    LifecycleAction::Killed | LifecycleAction::Crashed => {
                        this.decisions.handle_agent_killed(&agent_id);
                        this.registry.remove(&agent_id);
                        let this = this.clone();
                        tokio::spawn(async move {
                            this.collaborators.knowledge_store.remove_agent(&agent_id).await;
                        });
                    }
                }
            }),
        );
    }

    fn wire_completion_handler(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter {
                agent_id: None,
                event_type: Some("completion"),
            },
            Arc::new(move |envelope: &EventEnvelope| {
                let Event::Completion { agent_id, outcome, .. } = envelope.event().clone() else {
                    return;
                };
                this.apply_and_broadcast_trust(agent_id, completion_outcome(outcome));
            }),
        );
    }

    fn wire_error_handler(self: &Arc<Self>) {
        let this = self.clone();
        self.bus.subscribe(
            Filter {
                agent_id: None,
                event_type: Some("error"),
            },
            Arc::new(move |envelope: &EventEnvelope| {
                let Event::Error { agent_id, severity, .. } = envelope.event().clone() else {
                    return;
                };
                if severity == Severity::Warning {
                    return;
                }
                this.apply_and_broadcast_trust(agent_id, Outcome::ErrorEvent);
            }),
        );
    }

    fn apply_and_broadcast_trust(&self, agent_id: AgentId, outcome: Outcome) {
        let tick = self.tick_service.current_tick();
        let delta = self.trust.apply_outcome(agent_id.clone(), outcome, tick);
        if delta != 0 {
            let score = self.trust.score(&agent_id);
            self.collaborators
                .hub
                .broadcast(HubMessage::TrustUpdate { agent_id, score });
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
