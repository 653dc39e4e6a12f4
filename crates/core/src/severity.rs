// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Severity ordering shared by `error` and `coherence` events.

use serde::{Deserialize, Serialize};

/// Ordered severity: `warning < low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// True for `High` and `Critical`.
    pub fn is_at_least_high(&self) -> bool {
        *self >= Severity::High
    }
}

#[cfg(test)]
#[path = "severity_tests.rs"]
mod tests;
