// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-adapters: everything that talks to a live sandbox process — the
//! child-process supervisor, the reconnecting event stream client, the RPC
//! plugin, and the aggregating per-agent plugin that composes them.

mod plugin;
mod rpc;
mod stream;
mod supervisor;

pub use plugin::{AggregatingPlugin, PluginConfig, PluginError};
pub use rpc::{AdapterHttpError, ContextInjection, KillOptions, KillResult, RpcClient, RpcError};
pub use stream::{DisconnectHandler, EventStreamClient, StreamConfig};
pub use supervisor::{
    Bootstrap, ExitOutcome, SpawnConfig, SpawnedProcess, Supervisor, SupervisorError, Transport,
};
