// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnecting link to one sandbox's event WebSocket, per spec §4.9:
//! decode, validate, quarantine malformed frames, stamp ingest time, and
//! publish onto the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use corral_bus::EventBus;
use corral_core::{AdapterEvent, AgentId, Clock, Event, EventEnvelope};
use corral_engine::{validate_adapter_event, QuarantineRing};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

/// How an `EventStreamClient` is wired up.
pub struct StreamConfig {
    pub agent_id: AgentId,
    pub url: String,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl StreamConfig {
    pub fn new(agent_id: AgentId, url: impl Into<String>) -> Self {
        Self {
            agent_id,
            url: url.into(),
            initial_reconnect_delay: Duration::from_millis(500),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

/// Called when the socket closes, before a reconnect is scheduled.
pub type DisconnectHandler = Box<dyn Fn() + Send + Sync>;

/// Owns the background reconnect loop for one sandbox's event socket.
pub struct EventStreamClient {
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    closed: Arc<AtomicBool>,
}

impl EventStreamClient {
    /// Open the connection and start the reconnect loop in the background.
    /// Calling `connect` again on an already-connected (not yet closed)
    /// client is a no-op, per spec.
    pub fn connect(
        config: StreamConfig,
        bus: Arc<EventBus>,
        quarantine: Arc<QuarantineRing>,
        clock: Arc<dyn Clock>,
        on_disconnect: Option<DisconnectHandler>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let closed = Arc::new(AtomicBool::new(false));
        tokio::spawn(run(config, bus, quarantine, clock, on_disconnect, shutdown_rx));
        Self {
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            closed,
        }
    }

    /// Close the socket and cancel any pending reconnect. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

async fn run(
    config: StreamConfig,
    bus: Arc<EventBus>,
    quarantine: Arc<QuarantineRing>,
    clock: Arc<dyn Clock>,
    on_disconnect: Option<DisconnectHandler>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut attempts: u32 = 0;
    loop {
        let connected = tokio::select! {
            _ = &mut shutdown_rx => return,
            result = tokio_tungstenite::connect_async(&config.url) => result,
        };

        match connected {
            Ok((ws_stream, _)) => {
                attempts = 0;
                let (mut write, mut read) = ws_stream.split();
                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => {
                            let _ = write.close().await;
                            return;
                        }
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    handle_frame(&text, &config.agent_id, &bus, &quarantine, &clock);
                                }
                                Some(Ok(Message::Binary(bytes))) => {
                                    match std::str::from_utf8(&bytes) {
                                        Ok(text) => handle_frame(text, &config.agent_id, &bus, &quarantine, &clock),
                                        Err(e) => publish_non_json_warning(&config.agent_id, &bus, &clock, &e.to_string()),
                                    }
                                }
                                Some(Ok(Message::Close(_))) | None => break,
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    tracing::warn!(agent_id = %config.agent_id, error = %e, "event stream read error");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(agent_id = %config.agent_id, url = %config.url, error = %e, "event stream connect failed");
            }
        }

        if let Some(cb) = &on_disconnect {
            cb();
        }

        attempts += 1;
        let delay = reconnect_delay(config.initial_reconnect_delay, config.max_reconnect_delay, attempts);
        tokio::select! {
            _ = &mut shutdown_rx => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

fn reconnect_delay(initial: Duration, max: Duration, attempts: u32) -> Duration {
    let factor = 1u64 << attempts.saturating_sub(1).min(32);
    let scaled = initial.saturating_mul(factor as u32);
    scaled.min(max)
}

fn handle_frame(
    text: &str,
    agent_id: &AgentId,
    bus: &Arc<EventBus>,
    quarantine: &Arc<QuarantineRing>,
    clock: &Arc<dyn Clock>,
) {
    if let Err(parse_error) = serde_json::from_str::<serde_json::Value>(text) {
        publish_non_json_warning(agent_id, bus, clock, &parse_error.to_string());
        return;
    }

    match validate_adapter_event(text) {
        Ok(adapter_event) => {
            if adapter_event.event.agent_id() != agent_id {
                tracing::warn!(
                    configured_agent_id = %agent_id,
                    event_agent_id = %adapter_event.event.agent_id(),
                    "dropping event for mismatched agent id"
                );
                return;
            }
            let envelope = EventEnvelope::new(adapter_event, clock.now_ms());
            bus.publish(envelope);
        }
        Err(failure) => {
            quarantine.quarantine(failure.clone());
            let run_id = corral_core::event::synthetic_run::quarantine(agent_id.as_str(), clock.now_ms());
            let warning = Event::synthetic_quarantine_warning(agent_id.clone(), &failure.issues);
            let mut synthetic = AdapterEvent::synthetic(run_id, warning, clock.now_ms());
            synthetic.source_event_id = format!("quarantine-{}", synthetic.source_event_id);
            bus.publish(EventEnvelope::new(synthetic, clock.now_ms()));
        }
    }
}

fn publish_non_json_warning(agent_id: &AgentId, bus: &Arc<EventBus>, clock: &Arc<dyn Clock>, parse_error: &str) {
    let run_id = corral_core::event::synthetic_run::quarantine(agent_id.as_str(), clock.now_ms());
    let warning = Event::synthetic_non_json_warning(agent_id.clone(), parse_error);
    let mut synthetic = AdapterEvent::synthetic(run_id, warning, clock.now_ms());
    synthetic.source_event_id = format!("quarantine-{}", synthetic.source_event_id);
    bus.publish(EventEnvelope::new(synthetic, clock.now_ms()));
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
