// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fail-open, in-process pub/sub with per-agent bounded priority queues,
//! dedup, and backpressure synthesis.

use corral_core::{AdapterEvent, AgentId, Event, EventEnvelope, RunId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Priority class an event is enqueued under, per spec §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

fn priority_of(event: &Event) -> Priority {
    match event {
        Event::Decision { .. } | Event::Artifact { .. } | Event::Error { .. } => Priority::High,
        Event::Lifecycle { .. }
        | Event::Delegation { .. }
        | Event::Guardrail { .. }
        | Event::Completion { .. }
        | Event::Coherence { .. } => Priority::Medium,
        Event::Status { .. } | Event::ToolCall { .. } | Event::Progress { .. } | Event::RawProvider { .. } => {
            Priority::Low
        }
    }
}

/// Bus sizing and retention knobs.
#[derive(Debug, Clone, Copy)]
pub struct BusConfig {
    pub dedup_capacity: usize,
    pub max_queue_per_agent: usize,
    pub max_high_priority_per_agent: usize,
    pub max_sequence_gap_warnings: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        let max_queue_per_agent = 500;
        Self {
            dedup_capacity: 10_000,
            max_queue_per_agent,
            max_high_priority_per_agent: max_queue_per_agent * 2,
            max_sequence_gap_warnings: 1_000,
        }
    }
}

/// A gap detected in a run's `sourceSequence`. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceGapWarning {
    pub run_id: RunId,
    pub previous_sequence: i64,
    pub observed_sequence: i64,
}

/// Point-in-time counters, per spec §4.3/§8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusMetrics {
    pub total_published: u64,
    pub total_deduplicated: u64,
    pub total_dropped: u64,
}

/// `{agentId?, eventType?}` filter; absent fields match anything. Fields
/// combine with AND.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub agent_id: Option<AgentId>,
    pub event_type: Option<&'static str>,
}

impl Filter {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        if let Some(agent_id) = &self.agent_id {
            if envelope.event().agent_id() != agent_id {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if envelope.event().type_name() != event_type {
                return false;
            }
        }
        true
    }
}

/// Opaque handle returned by `subscribe`, passed back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&EventEnvelope) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    filter: Filter,
    handler: Handler,
}

struct QueueEntry {
    envelope: EventEnvelope,
    priority: Priority,
}

#[derive(Default)]
struct DedupState {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

/// Per-agent bounded priority queue with dedup and backpressure, per spec
/// §4.3. Safe for concurrent publishers and subscribers; subscriber handlers
/// are invoked synchronously, outside any internal lock, so a handler may
/// recursively call `publish` without deadlocking.
pub struct EventBus {
    config: BusConfig,
    dedup: Mutex<DedupState>,
    last_sequence: Mutex<HashMap<RunId, i64>>,
    subscriptions: Mutex<Vec<Subscription>>,
    queues: Mutex<HashMap<AgentId, VecDeque<QueueEntry>>>,
    sequence_gaps: Mutex<VecDeque<SequenceGapWarning>>,
    metrics: Mutex<BusMetrics>,
    next_subscription_id: AtomicU64,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            dedup: Mutex::new(DedupState::default()),
            last_sequence: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(Vec::new()),
            queues: Mutex::new(HashMap::new()),
            sequence_gaps: Mutex::new(VecDeque::new()),
            metrics: Mutex::new(BusMetrics::default()),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self, filter: Filter, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions.lock().push(Subscription {
            id,
            filter,
            handler,
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscriptions.lock().retain(|s| s.id != id);
    }

    /// Publish an envelope. Returns `false` if it was a duplicate (by
    /// `sourceEventId`) within the dedup window.
    pub fn publish(&self, envelope: EventEnvelope) -> bool {
        let source_event_id = envelope.adapter_event.source_event_id.clone();

        if !self.insert_dedup(&source_event_id) {
            self.metrics.lock().total_deduplicated += 1;
            return false;
        }

        self.check_sequence_gap(&envelope.adapter_event);

        self.metrics.lock().total_published += 1;

        self.deliver_to_subscribers(&envelope);

        let is_synthetic = envelope.adapter_event.is_synthetic();
        let agent_id = envelope.event().agent_id().clone();
        let priority = priority_of(envelope.event());
        let dropped = self.enqueue(agent_id.clone(), envelope, priority);

        if dropped && !is_synthetic {
            self.metrics.lock().total_dropped += 1;
            let warning = AdapterEvent::synthetic(
                RunId::new(format!("backpressure-{}", uuid::Uuid::new_v4())),
                Event::synthetic_backpressure(agent_id),
                chrono::Utc::now().timestamp_millis(),
            );
            self.publish(EventEnvelope::new(warning, chrono::Utc::now().timestamp_millis()));
        }

        true
    }

    fn insert_dedup(&self, source_event_id: &str) -> bool {
        let mut dedup = self.dedup.lock();
        if dedup.seen.contains(source_event_id) {
            return false;
        }
        dedup.seen.insert(source_event_id.to_string());
        dedup.order.push_back(source_event_id.to_string());
        if dedup.order.len() > self.config.dedup_capacity {
            if let Some(evicted) = dedup.order.pop_front() {
                dedup.seen.remove(&evicted);
            }
        }
        true
    }

    fn check_sequence_gap(&self, adapter_event: &AdapterEvent) {
        if adapter_event.is_synthetic() {
            return;
        }
        let mut last_sequence = self.last_sequence.lock();
        let run_id = adapter_event.run_id.clone();
        if let Some(&previous) = last_sequence.get(&run_id) {
            if adapter_event.source_sequence > previous + 1 {
                let mut gaps = self.sequence_gaps.lock();
                gaps.push_back(SequenceGapWarning {
                    run_id: run_id.clone(),
                    previous_sequence: previous,
                    observed_sequence: adapter_event.source_sequence,
                });
                if gaps.len() > self.config.max_sequence_gap_warnings {
                    gaps.pop_front();
                }
            }
        }
        last_sequence.insert(run_id, adapter_event.source_sequence);
    }

    fn deliver_to_subscribers(&self, envelope: &EventEnvelope) {
        let subscribers: Vec<(Filter, Handler)> = self
            .subscriptions
            .lock()
            .iter()
            .map(|s| (s.filter.clone(), Arc::clone(&s.handler)))
            .collect();

        for (filter, handler) in subscribers {
            if filter.matches(envelope) {
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(envelope))).is_err() {
                    tracing::warn!("bus subscriber handler panicked, continuing");
                }
            }
        }
    }

    /// Enqueue into the per-agent queue, evicting per spec §4.3 step 5 if
    /// needed. Returns whether anything was dropped for a *real* (non-
    /// synthetic) reason worth surfacing via `totalDropped`/a backpressure
    /// warning. Evictions made purely to make room for the control plane's
    /// own synthetic bookkeeping do not recurse into another synthesis —
    /// otherwise a saturated queue would synthesize backpressure warnings
    /// forever.
    fn enqueue(&self, agent_id: AgentId, envelope: EventEnvelope, priority: Priority) -> bool {
        let is_synthetic = envelope.adapter_event.is_synthetic();
        let mut queues = self.queues.lock();
        let queue = queues.entry(agent_id).or_default();

        let mut dropped_real = false;

        if queue.len() + 1 > self.config.max_queue_per_agent {
            if let Some(index) = queue.iter().position(|e| e.priority == Priority::Low) {
                queue.remove(index);
                dropped_real = dropped_real || !is_synthetic;
            } else if let Some(index) = queue.iter().position(|e| e.priority != Priority::High) {
                queue.remove(index);
                dropped_real = dropped_real || !is_synthetic;
            }
            // else: rule (c), no eviction — high-priority entries remain,
            // queue is allowed to exceed max_queue_per_agent momentarily.
        }

        queue.push_back(QueueEntry { envelope, priority });

        let high_count = queue.iter().filter(|e| e.priority == Priority::High).count();
        if high_count > self.config.max_high_priority_per_agent {
            if let Some(index) = queue.iter().position(|e| e.priority == Priority::High) {
                queue.remove(index);
                dropped_real = dropped_real || !is_synthetic;
            }
        }

        dropped_real
    }

    pub fn agent_queue_size(&self, agent_id: &AgentId) -> usize {
        self.queues
            .lock()
            .get(agent_id)
            .map(|q| q.len())
            .unwrap_or(0)
    }

    pub fn metrics(&self) -> BusMetrics {
        *self.metrics.lock()
    }

    pub fn sequence_gap_warnings(&self) -> Vec<SequenceGapWarning> {
        self.sequence_gaps.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
