// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use corral_bus::{BusConfig, Filter};
use corral_core::FakeClock;
use std::sync::atomic::AtomicUsize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Never resolves to a real process; kill-by-pid on it is a harmless ESRCH.
const UNUSED_PID: i32 = 999_999_999;

async fn one_shot_server(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 || buf[..n].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status} OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });
    format!("http://{addr}")
}

fn test_plugin() -> (Arc<AggregatingPlugin>, Arc<EventBus>) {
    let clock: Arc<dyn Clock> = Arc::new(FakeClock::new(1_000));
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let tokens = Arc::new(TokenService::new(b"secret".to_vec(), clock.clone()));
    let quarantine = Arc::new(QuarantineRing::new(100));
    let plugin = AggregatingPlugin::new(
        PluginConfig {
            name: "rpc".into(),
            backend_url: "http://localhost:1".into(),
            artifact_upload_endpoint: "http://localhost:1/artifacts".into(),
            token_ttl_ms: 60_000,
        },
        Arc::new(Supervisor::new()),
        tokens,
        bus.clone(),
        quarantine,
        clock,
    );
    (plugin, bus)
}

/// Insert a record without going through `spawn()`, using a never-connecting
/// stream client and an unused pid, so crash/kill logic can be exercised in
/// isolation.
fn insert_fake_record(
    plugin: &Arc<AggregatingPlugin>,
    agent_id: &AgentId,
    rpc_endpoint: &str,
) -> watch::Sender<Option<ExitOutcome>> {
    let (exit_tx, exit_rx) = watch::channel(None);
    let stream_client = EventStreamClient::connect(
        StreamConfig::new(agent_id.clone(), "ws://127.0.0.1:1/events".to_string()),
        plugin.bus.clone(),
        plugin.quarantine.clone(),
        plugin.clock.clone(),
        None,
    );
    let record = Arc::new(AgentRecord {
        rpc_client: Arc::new(RpcClient::new(reqwest::Client::new(), rpc_endpoint.to_string())),
        stream_client,
        port: 0,
        pid: UNUSED_PID,
        exit_rx,
        crash_handled: AtomicBool::new(false),
    });
    plugin.records.lock().insert(agent_id.clone(), record);
    exit_tx
}

#[tokio::test]
async fn handle_crash_emits_synthetic_error_and_lifecycle_once() {
    let (plugin, bus) = test_plugin();
    let agent_id = AgentId::new("agent-a");
    insert_fake_record(&plugin, &agent_id, "http://127.0.0.1:1");

    let seen = Arc::new(AtomicUsize::new(0));
    let seen2 = seen.clone();
    bus.subscribe(
        Filter::default(),
        Arc::new(move |_| {
            seen2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }),
    );

    plugin.clone().handle_crash(&agent_id, Some(1), None).await;
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert!(!plugin.has_agent(&agent_id));

    // A second observer of the same termination is a no-op.
    plugin.clone().handle_crash(&agent_id, Some(1), None).await;
    assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn handle_crash_with_clean_exit_emits_no_synthetic_events() {
    let (plugin, bus) = test_plugin();
    let agent_id = AgentId::new("agent-a");
    insert_fake_record(&plugin, &agent_id, "http://127.0.0.1:1");

    let called = Arc::new(AtomicUsize::new(0));
    let called2 = called.clone();
    plugin.set_on_agent_crash(move |_, _, _| {
        called2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    plugin.clone().handle_crash(&agent_id, Some(0), None).await;

    assert_eq!(bus.metrics().total_published, 0);
    assert_eq!(called.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn kill_uses_the_rpc_result_and_removes_the_record() {
    let (plugin, _bus) = test_plugin();
    let agent_id = AgentId::new("agent-a");
    let rpc_url = one_shot_server(200, r#"{"artifacts_extracted":5,"clean_shutdown":true}"#).await;
    let exit_tx = insert_fake_record(&plugin, &agent_id, &rpc_url);
    let _ = exit_tx.send(Some(ExitOutcome { code: Some(0), signal: None }));

    let result = plugin.clone().kill(&agent_id, KillOptions::default()).await;
    assert_eq!(result.artifacts_extracted, 5);
    assert!(result.clean_shutdown);
    assert!(!plugin.has_agent(&agent_id));
}

#[tokio::test]
async fn kill_falls_back_when_the_rpc_call_fails() {
    let (plugin, _bus) = test_plugin();
    let agent_id = AgentId::new("agent-a");
    // Nothing listens here.
    let exit_tx = insert_fake_record(&plugin, &agent_id, "http://127.0.0.1:1");
    let _ = exit_tx.send(Some(ExitOutcome { code: Some(0), signal: None }));

    let result = plugin.clone().kill(&agent_id, KillOptions::default()).await;
    assert_eq!(result.artifacts_extracted, 0);
    assert!(!result.clean_shutdown);
}

#[tokio::test]
async fn intentional_kill_suppresses_a_later_crash_observation() {
    let (plugin, bus) = test_plugin();
    let agent_id = AgentId::new("agent-a");
    let rpc_url = one_shot_server(200, r#"{"artifacts_extracted":0,"clean_shutdown":true}"#).await;
    let exit_tx = insert_fake_record(&plugin, &agent_id, &rpc_url);
    let _ = exit_tx.send(Some(ExitOutcome { code: Some(0), signal: None }));

    plugin.clone().kill(&agent_id, KillOptions::default()).await;

    // The process-exit listener fires after the intentional kill already
    // tore the record down; there is nothing left to observe.
    plugin.clone().handle_crash(&agent_id, Some(1), None).await;
    assert_eq!(bus.metrics().total_published, 0);
}
