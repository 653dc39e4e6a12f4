// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a sandbox emits on the wire, and the bus carrier wrapping it.

use crate::agent::RunId;
use crate::event::Event;
use serde::{Deserialize, Serialize};

/// Sequence number used by synthetic (control-plane-originated) events —
/// never collides with a real adapter stream, which starts at 0 or 1 and
/// only increases.
pub const SYNTHETIC_SEQUENCE: i64 = -1;

/// The record a sandbox emits, before the control plane stamps ingest time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterEvent {
    pub source_event_id: String,
    pub source_sequence: i64,
    pub source_occurred_at_ms: i64,
    pub run_id: RunId,
    pub event: Event,
}

impl AdapterEvent {
    /// Build a synthetic adapter event with `sourceSequence = -1` and a
    /// fresh `sourceEventId` so the bus's dedup window treats it as novel.
    pub fn synthetic(run_id: RunId, event: Event, now_ms: i64) -> Self {
        Self {
            source_event_id: uuid::Uuid::new_v4().to_string(),
            source_sequence: SYNTHETIC_SEQUENCE,
            source_occurred_at_ms: now_ms,
            run_id,
            event,
        }
    }

    /// Synthetic events never have a real source sequence.
    pub fn is_synthetic(&self) -> bool {
        self.source_sequence == SYNTHETIC_SEQUENCE
    }
}

/// The unit carried on the bus: an `AdapterEvent` plus the time the control
/// plane accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub adapter_event: AdapterEvent,
    pub ingested_at_ms: i64,
}

impl EventEnvelope {
    pub fn new(adapter_event: AdapterEvent, ingested_at_ms: i64) -> Self {
        Self {
            adapter_event,
            ingested_at_ms,
        }
    }

    pub fn event(&self) -> &Event {
        &self.adapter_event.event
    }
}

#[cfg(test)]
#[path = "adapter_event_tests.rs"]
mod tests;
