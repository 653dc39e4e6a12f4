// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawns and supervises a sandbox's child process, per spec §4.8: start
//! it, wait for it to announce the port it's listening on, poll its health
//! endpoint, and tear it down (gracefully, then forcibly) on request.

use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use thiserror::Error;

/// The JSON blob handed to a sandbox at spawn time via `AGENT_BOOTSTRAP`,
/// describing the backend it should call back into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bootstrap {
    pub backend_url: String,
    pub backend_token: String,
    pub token_expires_at: i64,
    pub agent_id: String,
    pub artifact_upload_endpoint: String,
}

/// How a sandbox is started and supervised.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub startup_timeout: Duration,
    pub health_poll_interval: Duration,
    pub health_check_timeout: Duration,
    pub graceful_shutdown_grace: Duration,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            startup_timeout: Duration::from_secs(30),
            health_poll_interval: Duration::from_millis(100),
            health_check_timeout: Duration::from_secs(10),
            graceful_shutdown_grace: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to spawn sandbox process: {0}")]
    SpawnFailed(#[source] std::io::Error),
    #[error("did not announce port within {0:?}")]
    PortAnnouncementTimeout(Duration),
    #[error("shim exited before announcing port")]
    PortAnnouncementClosed,
    #[error("sandbox port announcement was malformed: {0:?}")]
    PortAnnouncementMalformed(String),
    #[error("did not become healthy within {0:?}")]
    HealthCheckTimeout(Duration),
    #[error("failed to signal sandbox process: {0}")]
    Signal(#[source] std::io::Error),
}

/// Where the sandbox can be reached once it has announced its port.
#[derive(Debug, Clone)]
pub struct Transport {
    pub rpc_endpoint: String,
    pub event_stream_endpoint: String,
}

impl Transport {
    fn for_port(port: u16) -> Self {
        Self {
            rpc_endpoint: format!("http://localhost:{port}"),
            event_stream_endpoint: format!("ws://localhost:{port}/events"),
        }
    }
}

/// A spawned sandbox process, with the port it announced and its transport.
pub struct SpawnedProcess {
    pub child: Child,
    pub port: u16,
    pub transport: Transport,
}

/// Why a supervised process exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }
}

/// Spawns and tears down sandbox child processes.
pub struct Supervisor {
    http: reqwest::Client,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Spawn the sandbox, inject its bootstrap blob, wait for it to announce
    /// a listening port as a first-line JSON object `{"port": <int>}`, then
    /// poll `/health` until it responds or the configured timeouts elapse.
    pub async fn spawn_shim(
        &self,
        config: &SpawnConfig,
        bootstrap: &Bootstrap,
    ) -> Result<SpawnedProcess, SupervisorError> {
        let bootstrap_json =
            serde_json::to_string(bootstrap).map_err(|e| {
                SupervisorError::PortAnnouncementMalformed(format!("bootstrap serialization: {e}"))
            })?;

        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .env("AGENT_PORT", "0")
            .env("AGENT_BOOTSTRAP", bootstrap_json)
            .envs(&config.env)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(SupervisorError::SpawnFailed)?;
        #[allow(clippy::expect_used)]
        let stdout = child
            .stdout
            .take()
            .expect("stdout was configured as piped");
        #[allow(clippy::expect_used)]
        let stderr = child
            .stderr
            .take()
            .expect("stderr was configured as piped");
        tokio::spawn(forward_stderr_as_logs(stderr));

        let (port, remaining_stdout) =
            match tokio::time::timeout(config.startup_timeout, read_port_announcement(stdout)).await {
                Ok(result) => result?,
                Err(_) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(SupervisorError::PortAnnouncementTimeout(config.startup_timeout));
                }
            };
        tokio::spawn(forward_stdout_as_logs(remaining_stdout));

        if let Err(e) = self
            .wait_until_healthy(port, config.health_poll_interval, config.health_check_timeout)
            .await
        {
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(e);
        }

        Ok(SpawnedProcess {
            child,
            port,
            transport: Transport::for_port(port),
        })
    }

    async fn wait_until_healthy(
        &self,
        port: u16,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<(), SupervisorError> {
        let url = format!("http://127.0.0.1:{port}/health");
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.http.get(&url).send().await.is_ok_and(|r| r.status().is_success()) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SupervisorError::HealthCheckTimeout(timeout));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Send `SIGTERM` and wait up to `grace` for the process to exit on its
    /// own; force-kill it otherwise.
    pub async fn kill_process(
        &self,
        child: &mut Child,
        grace: Duration,
    ) -> Result<ExitOutcome, SupervisorError> {
        if let Some(pid) = child.id() {
            let pid = nix::unistd::Pid::from_raw(pid as i32);
            if let Err(e) = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM) {
                tracing::warn!(pid = pid.as_raw(), error = %e, "SIGTERM failed, force-killing");
                return self.force_kill_process(child).await;
            }
        }

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => Ok(status.into()),
            Ok(Err(e)) => Err(SupervisorError::Signal(e)),
            Err(_) => self.force_kill_process(child).await,
        }
    }

    /// Send a signal to a process by pid directly, bypassing `Child` — for
    /// callers (the aggregating plugin) that have handed the `Child` off to
    /// a dedicated exit-watcher task and only retain the pid.
    pub fn send_signal(&self, pid: i32, signal: nix::sys::signal::Signal) -> Result<(), SupervisorError> {
        match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), signal) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(SupervisorError::Signal(std::io::Error::other(e.to_string()))),
        }
    }

    /// Send `SIGKILL` and wait for the process to exit.
    pub async fn force_kill_process(&self, child: &mut Child) -> Result<ExitOutcome, SupervisorError> {
        let _ = child.start_kill();
        child
            .wait()
            .await
            .map(ExitOutcome::from)
            .map_err(SupervisorError::Signal)
    }

    /// Take ownership of `child` and spawn a background task that awaits
    /// its exit, carrying the resulting `ExitOutcome` back on the returned
    /// receiver. Call this only after any intentional `kill_process` —
    /// once handed over, `child` can no longer be signaled directly.
    pub fn watch_exit(&self, mut child: Child) -> oneshot::Receiver<ExitOutcome> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok(status) = child.wait().await {
                let _ = tx.send(ExitOutcome::from(status));
            }
        });
        rx
    }
}

type StdoutLines = tokio::io::Lines<BufReader<tokio::process::ChildStdout>>;

/// Per spec §4.8/§6: the sandbox's port announcement is a JSON object with a
/// numeric `port` field. Lines that aren't JSON objects at all are forwarded
/// as ordinary pre-announcement logs; a JSON object that looks like an
/// announcement attempt but carries a non-numeric `port` is malformed.
///
/// Returns the port alongside the still-open line reader, so the caller can
/// keep forwarding whatever the sandbox writes to stdout afterward.
async fn read_port_announcement(
    stdout: tokio::process::ChildStdout,
) -> Result<(u16, StdoutLines), SupervisorError> {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| SupervisorError::PortAnnouncementMalformed(e.to_string()))?
            .ok_or(SupervisorError::PortAnnouncementClosed)?;
        let trimmed = line.trim();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
            tracing::debug!(line = trimmed, "sandbox stdout before port announcement");
            continue;
        };
        let Some(port_value) = value.get("port") else {
            tracing::debug!(line = trimmed, "sandbox stdout before port announcement");
            continue;
        };
        let port = port_value
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| SupervisorError::PortAnnouncementMalformed(trimmed.to_string()))?;
        return Ok((port, lines));
    }
}

/// Forward every subsequent sandbox stdout line as a log, per spec §4.8 step
/// 3. Ends when the sandbox closes stdout.
async fn forward_stdout_as_logs(mut lines: StdoutLines) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::info!(line = %line, "sandbox stdout"),
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "sandbox stdout read failed");
                return;
            }
        }
    }
}

/// Forward the sandbox's stderr as logs for as long as it's piped. Draining
/// this is required even if nothing reads it: an unread pipe fills and
/// blocks the child once its OS buffer is exhausted.
async fn forward_stderr_as_logs(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::warn!(line = %line, "sandbox stderr"),
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "sandbox stderr read failed");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
