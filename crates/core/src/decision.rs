// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decision identifiers. The decision queue state machine itself lives in
//! `corral-engine`, which depends on these types plus `Event`.

crate::define_id! {
    /// Unique identifier for a human-in-the-loop decision.
    pub struct DecisionId;
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
