// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-core: domain types shared by every other crate in the workspace —
//! the agent bus's event vocabulary, ids, the pure event classifier, and the
//! clock/tick primitives used for deterministic tests.

pub mod adapter_event;
pub mod agent;
pub mod brief;
pub mod classifier;
pub mod clock;
pub mod decision;
pub mod event;
pub mod id;
pub mod severity;
pub mod tick;
pub mod trust;

pub use adapter_event::{AdapterEvent, EventEnvelope, SYNTHETIC_SEQUENCE};
pub use agent::{AgentHandle, AgentId, AgentStatus, RunId, SessionId};
pub use brief::{
    AgentBrief, BriefChanges, Checkpoint, ControlMode, EscalationProtocol, ProjectBrief,
    SerializedAgentState, SerializedBy,
};
pub use classifier::{classify, Routing, Workspace};
pub use clock::{Clock, FakeClock, SystemClock};
pub use decision::DecisionId;
pub use event::{
    CompletionOutcome, DecisionChoice, DecisionSubtype, Event, LifecycleAction, Provenance,
    ToolCallPhase,
};
pub use id::ShortId;
pub use severity::Severity;
pub use tick::{TickMode, TickService};
pub use trust::Outcome;
