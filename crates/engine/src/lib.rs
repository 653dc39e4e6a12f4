// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-engine: the stateful decision-making pieces of the control plane —
//! trust scoring, the decision checkpoint queue, and inbound frame
//! validation/quarantine.

pub mod decisions;
pub mod trust;
pub mod validate;

pub use decisions::{DecisionError, DecisionPriority, DecisionQueue, DecisionRecord, DecisionState};
pub use trust::TrustEngine;
pub use validate::{validate_adapter_event, QuarantineRing, ValidationFailure};
