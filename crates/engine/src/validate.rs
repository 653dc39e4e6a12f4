// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validates raw adapter frames before they become bus envelopes, and
//! retains rejected frames in a bounded quarantine ring for inspection, per
//! spec §4.7.

use corral_core::AdapterEvent;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A frame that failed validation, with the reasons why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub issues: Vec<String>,
    pub raw: String,
}

/// Parse and sanity-check a raw adapter frame. Deserialization failures
/// (unknown `type` tag, missing field, wrong shape) and semantic issues
/// (negative sequence, empty id) are both reported as `issues`.
pub fn validate_adapter_event(raw: &str) -> Result<AdapterEvent, ValidationFailure> {
    let adapter_event = match serde_json::from_str::<AdapterEvent>(raw) {
        Ok(event) => event,
        Err(e) => {
            return Err(ValidationFailure {
                issues: vec![e.to_string()],
                raw: raw.to_string(),
            })
        }
    };

    let mut issues = Vec::new();
    if adapter_event.source_event_id.trim().is_empty() {
        issues.push("source_event_id must not be empty".to_string());
    }
    if adapter_event.source_sequence < 0 {
        issues.push(format!(
            "source_sequence must be >= 0, got {}",
            adapter_event.source_sequence
        ));
    }

    if issues.is_empty() {
        Ok(adapter_event)
    } else {
        Err(ValidationFailure {
            issues,
            raw: raw.to_string(),
        })
    }
}

/// Bounded FIFO of recently quarantined frames, oldest evicted first.
pub struct QuarantineRing {
    capacity: usize,
    entries: Mutex<VecDeque<ValidationFailure>>,
}

impl QuarantineRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn quarantine(&self, failure: ValidationFailure) {
        let mut entries = self.entries.lock();
        entries.push_back(failure);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn list(&self) -> Vec<ValidationFailure> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
