// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates lifecycle operations into HTTP calls on a sandbox, per
//! spec §4.10.

use corral_core::{AgentBrief, AgentHandle, BriefChanges, DecisionId, SerializedAgentState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A non-2xx response from a sandbox RPC call.
#[derive(Debug, Error, Clone)]
#[error("sandbox RPC {endpoint} returned {status_code}: {body}")]
pub struct AdapterHttpError {
    pub endpoint: String,
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Http(#[from] AdapterHttpError),
    #[error("network error calling sandbox: {0}")]
    Network(#[from] reqwest::Error),
}

/// Options passed to `kill`.
#[derive(Debug, Clone, Serialize)]
pub struct KillOptions {
    #[serde(default = "default_true")]
    pub grace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_timeout_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for KillOptions {
    fn default() -> Self {
        Self {
            grace: true,
            grace_timeout_ms: None,
        }
    }
}

/// Result of a `kill` call.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KillResult {
    pub artifacts_extracted: u32,
    pub clean_shutdown: bool,
}

/// A context-injection payload.
#[derive(Debug, Clone, Serialize)]
pub struct ContextInjection {
    pub content: String,
    pub format: String,
    pub snapshot_version: u64,
    pub estimated_tokens: u64,
    pub priority: String,
}

#[derive(Serialize)]
struct ResolveDecisionBody<'a> {
    decision_id: &'a DecisionId,
    resolution: &'a Value,
}

#[derive(Serialize)]
struct UpdateBriefBody<'a> {
    changes: &'a BriefChanges,
}

#[derive(Serialize)]
struct CheckpointBody<'a> {
    decision_id: &'a DecisionId,
}

/// Talks to one sandbox's HTTP surface. Bound to a single agent's transport
/// endpoint for its lifetime.
pub struct RpcClient {
    http: reqwest::Client,
    rpc_endpoint: String,
}

impl RpcClient {
    pub fn new(http: reqwest::Client, rpc_endpoint: impl Into<String>) -> Self {
        Self {
            http,
            rpc_endpoint: rpc_endpoint.into(),
        }
    }

    pub async fn spawn(&self, brief: &AgentBrief) -> Result<AgentHandle, RpcError> {
        self.post("/spawn", brief).await
    }

    pub async fn pause(&self) -> Result<SerializedAgentState, RpcError> {
        self.post_empty("/pause").await
    }

    pub async fn resume(&self, state: &SerializedAgentState) -> Result<AgentHandle, RpcError> {
        self.post("/resume", state).await
    }

    pub async fn kill(&self, opts: &KillOptions) -> Result<KillResult, RpcError> {
        self.post("/kill", opts).await
    }

    pub async fn resolve_decision(
        &self,
        decision_id: &DecisionId,
        resolution: &Value,
    ) -> Result<(), RpcError> {
        self.post_no_response(
            "/resolve",
            &ResolveDecisionBody {
                decision_id,
                resolution,
            },
        )
        .await
    }

    pub async fn inject_context(&self, injection: &ContextInjection) -> Result<(), RpcError> {
        self.post_no_response("/inject-context", injection).await
    }

    pub async fn update_brief(&self, changes: &BriefChanges) -> Result<(), RpcError> {
        self.post_no_response("/update-brief", &UpdateBriefBody { changes })
            .await
    }

    pub async fn request_checkpoint(
        &self,
        decision_id: &DecisionId,
    ) -> Result<SerializedAgentState, RpcError> {
        self.post("/checkpoint", &CheckpointBody { decision_id }).await
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, RpcError> {
        let response = self
            .http
            .post(format!("{}{}", self.rpc_endpoint, path))
            .json(body)
            .send()
            .await?;
        self.read_json(path, response).await
    }

    async fn post_empty<R: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<R, RpcError> {
        let response = self
            .http
            .post(format!("{}{}", self.rpc_endpoint, path))
            .send()
            .await?;
        self.read_json(path, response).await
    }

    async fn post_no_response<B: Serialize>(&self, path: &str, body: &B) -> Result<(), RpcError> {
        let response = self
            .http
            .post(format!("{}{}", self.rpc_endpoint, path))
            .json(body)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.http_error(path, response).await.into())
        }
    }

    async fn read_json<R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<R, RpcError> {
        if !response.status().is_success() {
            return Err(self.http_error(path, response).await.into());
        }
        Ok(response.json::<R>().await?)
    }

    async fn http_error(&self, path: &str, response: reqwest::Response) -> AdapterHttpError {
        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AdapterHttpError {
            endpoint: path.to_string(),
            status_code,
            body,
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
