// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composes the supervisor, RPC client, and event stream client into one
//! per-agent record, per spec §4.11: crash detection deduplicated between
//! process-exit and stream-disconnect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use corral_bus::EventBus;
use corral_core::{
    AdapterEvent, AgentBrief, AgentHandle, AgentId, BriefChanges, Clock, DecisionId, Event,
    EventEnvelope,
};
use corral_engine::QuarantineRing;
use corral_token::TokenService;
use nix::sys::signal::Signal;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use crate::rpc::{ContextInjection, KillOptions, KillResult, RpcClient, RpcError};
use crate::stream::{DisconnectHandler, EventStreamClient, StreamConfig};
use crate::supervisor::{Bootstrap, ExitOutcome, SpawnConfig, SpawnedProcess, Supervisor, SupervisorError};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Token(#[from] corral_token::TokenError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("no such agent: {0}")]
    NoSuchAgent(AgentId),
}

/// What the plugin needs to know beyond a spawn config in order to stand up
/// a sandbox and wire it back into this control plane.
pub struct PluginConfig {
    pub name: String,
    pub backend_url: String,
    pub artifact_upload_endpoint: String,
    pub token_ttl_ms: i64,
}

struct AgentRecord {
    rpc_client: Arc<RpcClient>,
    stream_client: EventStreamClient,
    #[allow(dead_code)] // part of the record per spec §4.11; not yet read elsewhere
    port: u16,
    pid: i32,
    exit_rx: watch::Receiver<Option<ExitOutcome>>,
    crash_handled: AtomicBool,
}

/// Composes supervisor + RPC + stream client into one per-agent record.
/// Public operation surface matches the RPC plugin's.
pub struct AggregatingPlugin {
    config: PluginConfig,
    supervisor: Arc<Supervisor>,
    tokens: Arc<TokenService>,
    bus: Arc<EventBus>,
    quarantine: Arc<QuarantineRing>,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    records: Mutex<HashMap<AgentId, Arc<AgentRecord>>>,
    on_agent_crash: Mutex<Option<Box<dyn Fn(&AgentId, Option<i32>, Option<i32>) + Send + Sync>>>,
}

impl AggregatingPlugin {
    pub fn new(
        config: PluginConfig,
        supervisor: Arc<Supervisor>,
        tokens: Arc<TokenService>,
        bus: Arc<EventBus>,
        quarantine: Arc<QuarantineRing>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            supervisor,
            tokens,
            bus,
            quarantine,
            clock,
            http: reqwest::Client::new(),
            records: Mutex::new(HashMap::new()),
            on_agent_crash: Mutex::new(None),
        })
    }

    pub fn set_on_agent_crash(
        &self,
        callback: impl Fn(&AgentId, Option<i32>, Option<i32>) + Send + Sync + 'static,
    ) {
        *self.on_agent_crash.lock() = Some(Box::new(callback));
    }

    pub fn has_agent(&self, agent_id: &AgentId) -> bool {
        self.records.lock().contains_key(agent_id)
    }

    /// Spawn the sandbox, wire its token/transport/stream, and hand its
    /// brief to the sandbox over RPC.
    pub async fn spawn(
        self: &Arc<Self>,
        spawn_config: SpawnConfig,
        brief: AgentBrief,
    ) -> Result<AgentHandle, PluginError> {
        let agent_id = brief.agent_id.clone();

        let issued = self
            .tokens
            .issue_token(agent_id.clone(), None, Some(self.config.token_ttl_ms))?;
        let bootstrap = Bootstrap {
            backend_url: self.config.backend_url.clone(),
            backend_token: issued.token,
            token_expires_at: issued.expires_at_ms,
            agent_id: agent_id.to_string(),
            artifact_upload_endpoint: self.config.artifact_upload_endpoint.clone(),
        };

        let SpawnedProcess { child, port, transport } =
            self.supervisor.spawn_shim(&spawn_config, &bootstrap).await?;
        #[allow(clippy::expect_used)]
        let pid = child.id().expect("freshly spawned child has a pid") as i32;

        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_outcome_rx = self.supervisor.watch_exit(child);
        {
            let plugin = self.clone();
            let agent_id = agent_id.clone();
            tokio::spawn(async move {
                if let Ok(outcome) = exit_outcome_rx.await {
                    let _ = exit_tx.send(Some(outcome));
                    plugin.handle_crash(&agent_id, outcome.code, outcome.signal).await;
                }
            });
        }

        let rpc_client = Arc::new(RpcClient::new(self.http.clone(), transport.rpc_endpoint.clone()));

        let stream_config = StreamConfig::new(agent_id.clone(), transport.event_stream_endpoint.clone());
        let on_disconnect: DisconnectHandler = {
            let plugin = self.clone();
            let agent_id = agent_id.clone();
            Box::new(move || {
                let plugin = plugin.clone();
                let agent_id = agent_id.clone();
                tokio::spawn(async move { plugin.on_stream_disconnect(&agent_id).await });
            })
        };
        let stream_client = EventStreamClient::connect(
            stream_config,
            self.bus.clone(),
            self.quarantine.clone(),
            self.clock.clone(),
            Some(on_disconnect),
        );

        let record = Arc::new(AgentRecord {
            rpc_client: rpc_client.clone(),
            stream_client,
            port,
            pid,
            exit_rx,
            crash_handled: AtomicBool::new(false),
        });
        self.records.lock().insert(agent_id.clone(), record.clone());

        match rpc_client.spawn(&brief).await {
            Ok(mut handle) => {
                handle.plugin_name = self.config.name.clone();
                Ok(handle)
            }
            Err(e) => {
                record.stream_client.close();
                let _ = self.supervisor.send_signal(record.pid, Signal::SIGKILL);
                self.records.lock().remove(&agent_id);
                Err(PluginError::Rpc(e))
            }
        }
    }

    /// Intentional kill. Marks the crash pipeline as already handled so a
    /// concurrent process-exit/disconnect observation is a no-op.
    pub async fn kill(self: &Arc<Self>, agent_id: &AgentId, opts: KillOptions) -> KillResult {
        let record = match self.records.lock().get(agent_id).cloned() {
            Some(r) => r,
            None => {
                return KillResult {
                    artifacts_extracted: 0,
                    clean_shutdown: false,
                }
            }
        };
        record.crash_handled.store(true, Ordering::SeqCst);

        let result = record.rpc_client.kill(&opts).await.unwrap_or(KillResult {
            artifacts_extracted: 0,
            clean_shutdown: false,
        });

        record.stream_client.close();

        let grace = Duration::from_millis(if opts.grace {
            opts.grace_timeout_ms.unwrap_or(2_000)
        } else {
            0
        });
        let _ = self.supervisor.send_signal(record.pid, Signal::SIGTERM);
        if wait_for_exit(record.exit_rx.clone(), grace).await.is_none() {
            let _ = self.supervisor.send_signal(record.pid, Signal::SIGKILL);
        }

        self.records.lock().remove(agent_id);
        result
    }

    pub async fn kill_all(self: &Arc<Self>) {
        let agent_ids: Vec<AgentId> = self.records.lock().keys().cloned().collect();
        for agent_id in agent_ids {
            self.kill(&agent_id, KillOptions::default()).await;
        }
    }

    pub async fn pause(&self, agent_id: &AgentId) -> Result<corral_core::SerializedAgentState, PluginError> {
        Ok(self.rpc_for(agent_id)?.pause().await?)
    }

    pub async fn resume(
        &self,
        agent_id: &AgentId,
        state: &corral_core::SerializedAgentState,
    ) -> Result<AgentHandle, PluginError> {
        Ok(self.rpc_for(agent_id)?.resume(state).await?)
    }

    pub async fn resolve_decision(
        &self,
        agent_id: &AgentId,
        decision_id: &DecisionId,
        resolution: &serde_json::Value,
    ) -> Result<(), PluginError> {
        Ok(self.rpc_for(agent_id)?.resolve_decision(decision_id, resolution).await?)
    }

    pub async fn inject_context(
        &self,
        agent_id: &AgentId,
        injection: &ContextInjection,
    ) -> Result<(), PluginError> {
        Ok(self.rpc_for(agent_id)?.inject_context(injection).await?)
    }

    pub async fn update_brief(&self, agent_id: &AgentId, changes: &BriefChanges) -> Result<(), PluginError> {
        Ok(self.rpc_for(agent_id)?.update_brief(changes).await?)
    }

    pub async fn request_checkpoint(
        &self,
        agent_id: &AgentId,
        decision_id: &DecisionId,
    ) -> Result<corral_core::SerializedAgentState, PluginError> {
        Ok(self.rpc_for(agent_id)?.request_checkpoint(decision_id).await?)
    }

    fn rpc_for(&self, agent_id: &AgentId) -> Result<Arc<RpcClient>, PluginError> {
        self.records
            .lock()
            .get(agent_id)
            .map(|r| r.rpc_client.clone())
            .ok_or_else(|| PluginError::NoSuchAgent(agent_id.clone()))
    }

    async fn on_stream_disconnect(self: Arc<Self>, agent_id: &AgentId) {
        let record = match self.records.lock().get(agent_id).cloned() {
            Some(r) if !r.crash_handled.load(Ordering::SeqCst) => r,
            _ => return,
        };
        if let Some(outcome) = *record.exit_rx.borrow() {
            self.handle_crash(agent_id, outcome.code, outcome.signal).await;
        }
        // Still alive: the stream client's own reconnect loop handles it.
    }

    async fn handle_crash(self: Arc<Self>, agent_id: &AgentId, code: Option<i32>, signal: Option<i32>) {
        let record = match self.records.lock().get(agent_id).cloned() {
            Some(r) => r,
            None => return,
        };
        if record.crash_handled.swap(true, Ordering::SeqCst) {
            return;
        }

        record.stream_client.close();
        self.records.lock().remove(agent_id);

        if let Some(callback) = self.on_agent_crash.lock().as_ref() {
            callback(agent_id, code, signal);
        }

        if code == Some(0) {
            return;
        }

        let now_ms = self.clock.now_ms();
        let run_id = corral_core::event::synthetic_run::crash(agent_id.as_str(), now_ms);
        let error_event = Event::synthetic_crash_error(agent_id.clone(), code, signal);
        self.bus.publish(EventEnvelope::new(
            AdapterEvent::synthetic(run_id.clone(), error_event, now_ms),
            now_ms,
        ));
        let lifecycle_event = Event::synthetic_crash_lifecycle(agent_id.clone(), code, signal);
        self.bus.publish(EventEnvelope::new(
            AdapterEvent::synthetic(run_id, lifecycle_event, now_ms),
            now_ms,
        ));
    }
}

/// Fake process/transport doubles for other crates' integration tests:
/// install a record with no real child or socket, then drive the crash
/// pipeline as if a process-exit had been observed.
#[cfg(feature = "test-support")]
impl AggregatingPlugin {
    pub fn install_fake_record_for_test(self: &Arc<Self>, agent_id: &AgentId, rpc_endpoint: &str) {
        let (_exit_tx, exit_rx) = watch::channel(None);
        let stream_client = EventStreamClient::connect(
            StreamConfig::new(agent_id.clone(), "ws://127.0.0.1:1/events".to_string()),
            self.bus.clone(),
            self.quarantine.clone(),
            self.clock.clone(),
            None,
        );
        let record = Arc::new(AgentRecord {
            rpc_client: Arc::new(RpcClient::new(reqwest::Client::new(), rpc_endpoint.to_string())),
            stream_client,
            port: 0,
            pid: -1,
            exit_rx,
            crash_handled: AtomicBool::new(false),
        });
        self.records.lock().insert(agent_id.clone(), record);
    }

    pub async fn simulate_exit_for_test(self: &Arc<Self>, agent_id: &AgentId, code: Option<i32>, signal: Option<i32>) {
        self.clone().handle_crash(agent_id, code, signal).await;
    }
}

async fn wait_for_exit(mut rx: watch::Receiver<Option<ExitOutcome>>, timeout: Duration) -> Option<ExitOutcome> {
    if let Some(outcome) = *rx.borrow() {
        return Some(outcome);
    }
    let _ = tokio::time::timeout(timeout, rx.changed()).await;
    *rx.borrow()
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
