// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure routing table from an event to the UI workspaces that should
//! receive it. No state; equal inputs always produce equal outputs.

use crate::event::{DecisionSubtype, Event};
use serde::{Deserialize, Serialize};

/// One of the four UI channels events are routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workspace {
    Briefing,
    Queue,
    Map,
    Controls,
}

/// The primary workspace an event is routed to, and an optional secondary
/// workspace for events that also matter elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Routing {
    pub primary: Workspace,
    pub secondary: Option<Workspace>,
}

impl Routing {
    fn just(primary: Workspace) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    fn with(primary: Workspace, secondary: Workspace) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }
}

/// Classify an event into its primary (and optional conditional secondary)
/// workspace, per spec §4.4.
pub fn classify(event: &Event) -> Routing {
    use Workspace::*;

    match event {
        Event::Status { .. } => Routing::just(Briefing),
        Event::Progress { .. } => Routing::just(Briefing),
        Event::ToolCall { .. } => Routing::just(Controls),
        Event::Decision { subtype, .. } => match subtype {
            DecisionSubtype::Option => Routing::with(Queue, Briefing),
            DecisionSubtype::ToolApproval => Routing::with(Queue, Controls),
        },
        Event::Artifact { .. } => Routing::with(Map, Briefing),
        Event::Coherence { severity, .. } => {
            if severity.is_at_least_high() {
                Routing::with(Map, Queue)
            } else {
                Routing::just(Map)
            }
        }
        Event::Completion { .. } => Routing::with(Briefing, Controls),
        Event::Error { severity, .. } => {
            if severity.is_at_least_high() {
                Routing::with(Controls, Briefing)
            } else {
                Routing::just(Controls)
            }
        }
        Event::Delegation { .. } => Routing::with(Controls, Briefing),
        Event::Guardrail { tripped, .. } => {
            if *tripped {
                Routing::with(Controls, Queue)
            } else {
                Routing::just(Controls)
            }
        }
        Event::Lifecycle { .. } => Routing::with(Controls, Briefing),
        Event::RawProvider { .. } => Routing::just(Controls),
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
