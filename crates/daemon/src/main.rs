// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! corrald — the control-plane daemon. Spawns agent sandboxes, fans their
//! events through the bus, and applies the decision/trust/coherence
//! wiring in `pipeline`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;
use std::time::Duration;

use corral_adapters::{AggregatingPlugin, ContextInjection, PluginConfig, Supervisor};
use corral_bus::EventBus;
use corral_core::{SystemClock, TickMode, TickService};
use corral_daemon::{AgentRegistry, Collaborators, Config, ContextInjectionScheduler, NullCoherenceMonitor, Pipeline};
use corral_daemon::{InMemoryKnowledgeStore, RecordingWebSocketHub};
use corral_engine::{DecisionQueue, QuarantineRing, TrustEngine};
use corral_token::TokenService;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Outer deadline for the whole kill-all pass during shutdown, per spec §5.
const SHUTDOWN_KILL_DEADLINE: Duration = Duration::from_secs(3);

/// Backstop: if graceful shutdown hasn't finished by this point, exit anyway.
const SHUTDOWN_BACKSTOP: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let config = Config::load()?;
    info!("starting corrald");

    let clock: Arc<dyn corral_core::Clock> = Arc::new(SystemClock);
    let bus = Arc::new(EventBus::new(config.bus));
    let tokens = Arc::new(TokenService::new(config.token_secret.clone(), clock.clone()).with_default_ttl_ms(config.token_ttl_ms));
    let quarantine = Arc::new(QuarantineRing::new(config.quarantine_capacity));
    let supervisor = Arc::new(Supervisor::new());
    let plugin = AggregatingPlugin::new(
        PluginConfig {
            name: config.plugin_name.clone(),
            backend_url: config.backend_url.clone(),
            artifact_upload_endpoint: config.artifact_upload_endpoint.clone(),
            token_ttl_ms: config.token_ttl_ms,
        },
        supervisor,
        tokens,
        bus.clone(),
        quarantine,
        clock.clone(),
    );

    let registry = Arc::new(AgentRegistry::new());
    let decisions = Arc::new(DecisionQueue::new(config.decision_grace_period_ticks));
    let trust = Arc::new(TrustEngine::new());
    let tick_service = Arc::new(TickService::new(TickMode::WallClock(config.tick_interval)));
    trust.subscribe_to(&tick_service);
    let decisions_for_tick = decisions.clone();
    tick_service.subscribe_to(Box::new(move |tick| decisions_for_tick.escalate_expired(tick)));

    // No production storage/coherence/WS backend is wired up yet; these
    // in-memory collaborators keep the pipeline fully functional for a
    // single-process deployment.
    let collaborators = Collaborators {
        knowledge_store: Arc::new(InMemoryKnowledgeStore::new()),
        coherence_monitor: Arc::new(NullCoherenceMonitor),
        hub: Arc::new(RecordingWebSocketHub::new()),
    };

    let pipeline = Pipeline::new(
        bus.clone(),
        plugin.clone(),
        registry.clone(),
        decisions,
        trust,
        tick_service.clone(),
        clock,
        collaborators,
    );
    pipeline.wire();

    tick_service.start();

    let context_injection = ContextInjectionScheduler::new(config.context_injection_interval);
    let injection_plugin = plugin.clone();
    let injection_registry = registry.clone();
    context_injection.start(Box::new(move || {
        let plugin = injection_plugin.clone();
        let registry = injection_registry.clone();
        tokio::spawn(async move {
            for handle in registry.all() {
                let injection = ContextInjection {
                    content: String::new(),
                    format: "text".to_string(),
                    snapshot_version: 0,
                    estimated_tokens: 0,
                    priority: "low".to_string(),
                };
                if let Err(err) = plugin.inject_context(&handle.id, &injection).await {
                    tracing::warn!(agent_id = %handle.id, error = %err, "context injection failed");
                }
            }
        });
    }));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(addr = %config.http_addr, "corrald ready");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    shutdown(tick_service, context_injection, plugin).await;
    info!("corrald stopped");
    Ok(())
}

/// Implements the shutdown sequence from spec §5: stop the tick service,
/// stop context injection, kill every agent (bounded by an outer deadline),
/// then a backstop timer forces the process to exit regardless.
async fn shutdown(
    tick_service: Arc<TickService>,
    context_injection: ContextInjectionScheduler,
    plugin: Arc<AggregatingPlugin>,
) {
    tokio::spawn(async move {
        tokio::time::sleep(SHUTDOWN_BACKSTOP).await;
        tracing::error!("shutdown backstop elapsed, forcing exit");
        std::process::exit(1);
    });

    tick_service.stop();
    context_injection.stop();

    if tokio::time::timeout(SHUTDOWN_KILL_DEADLINE, plugin.kill_all()).await.is_err() {
        tracing::warn!("kill-all did not finish within the outer shutdown deadline");
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}
