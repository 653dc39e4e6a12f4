// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-agent trust score, adjusted by observed outcomes per spec §4.5.
//! Scores are clamped to `[10, 100]` and default to 50 for an agent never
//! seen before.

use corral_core::{AgentId, Outcome, TickService};
use parking_lot::Mutex;
use std::collections::HashMap;

const MIN_SCORE: i32 = 10;
const MAX_SCORE: i32 = 100;
const DEFAULT_SCORE: i32 = 50;
const HIGH_WATERMARK: i32 = 90;
const LOW_WATERMARK: i32 = 20;

/// Tracks and updates per-agent trust scores.
pub struct TrustEngine {
    scores: Mutex<HashMap<AgentId, i32>>,
}

impl Default for TrustEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustEngine {
    pub fn new() -> Self {
        Self {
            scores: Mutex::new(HashMap::new()),
        }
    }

    /// Current score for `agent_id`, or the default if unseen.
    pub fn score(&self, agent_id: &AgentId) -> i32 {
        self.scores
            .lock()
            .get(agent_id)
            .copied()
            .unwrap_or(DEFAULT_SCORE)
    }

    /// Apply an observed outcome's delta to `agent_id`'s score at `tick`,
    /// with diminishing returns near the watermarks, and return the signed
    /// delta actually applied (post-clamp `new_score - current`).
    ///
    /// `tick` is unused today — reserved for the same future time-decay pass
    /// `subscribe_to` stubs out — but is part of the call's contract.
    pub fn apply_outcome(&self, agent_id: AgentId, outcome: Outcome, _tick: u64) -> i32 {
        let mut scores = self.scores.lock();
        let current = scores.get(&agent_id).copied().unwrap_or(DEFAULT_SCORE);
        let base_delta = outcome.base_delta();

        let delta = if current > HIGH_WATERMARK && base_delta > 0 {
            (base_delta / 2).max(1)
        } else if current < LOW_WATERMARK && base_delta < 0 {
            base_delta / 2
        } else {
            base_delta
        };

        let new_score = (current + delta).clamp(MIN_SCORE, MAX_SCORE);
        scores.insert(agent_id, new_score);
        new_score - current
    }

    /// Hook reserved for a future periodic trust-decay pass; currently a
    /// no-op, since outcomes alone drive the score today.
    pub fn subscribe_to(&self, tick_service: &TickService) {
        tick_service.subscribe_to(Box::new(|_tick| {}));
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
