// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared trust-engine vocabulary. The clamped-score state machine itself
//! lives in `corral-engine::trust`; these types are here so both the engine
//! and the daemon pipeline wiring (which maps bus events to outcomes) can
//! depend on them without the engine depending on the daemon.

use serde::{Deserialize, Serialize};

/// A human or lifecycle outcome that moves an agent's trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    HumanApprovesToolCall,
    HumanRejectsToolCall,
    HumanApprovesRecommendedOption,
    HumanPicksNonRecommended,
    HumanOverridesAgentDecision,
    HumanApprovesAlways,
    TaskCompletedClean,
    TaskCompletedPartial,
    TaskAbandonedOrMaxTurns,
    ErrorEvent,
}

impl Outcome {
    /// Base delta before clamping and diminishing returns, per spec §4.5.
    pub fn base_delta(&self) -> i32 {
        match self {
            Outcome::HumanApprovesToolCall => 1,
            Outcome::HumanRejectsToolCall => -2,
            Outcome::HumanApprovesRecommendedOption => 2,
            Outcome::HumanPicksNonRecommended => -1,
            Outcome::HumanOverridesAgentDecision => -3,
            Outcome::HumanApprovesAlways => 3,
            Outcome::TaskCompletedClean => 3,
            Outcome::TaskCompletedPartial => 1,
            Outcome::TaskAbandonedOrMaxTurns => -2,
            Outcome::ErrorEvent => -2,
        }
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
