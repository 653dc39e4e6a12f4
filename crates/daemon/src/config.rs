// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

use corral_bus::BusConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("environment variable `{name}` has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Everything the daemon binary needs to stand up the bus, plugin,
/// tick service, and decision queue. Loaded once at startup from the
/// environment; nothing here is reloaded at runtime.
#[derive(Debug, Clone)]
pub struct Config {
    pub bus: BusConfig,
    pub token_secret: Vec<u8>,
    pub token_ttl_ms: i64,
    pub quarantine_capacity: usize,
    pub decision_grace_period_ticks: u64,
    pub tick_interval: Duration,
    pub context_injection_interval: Duration,
    pub plugin_name: String,
    pub backend_url: String,
    pub artifact_upload_endpoint: String,
    pub http_addr: String,
}

impl Config {
    /// Load from the environment, falling back to defaults suitable for
    /// local development. `CORRAL_TOKEN_SECRET` is the only variable a
    /// production deployment must set explicitly.
    pub fn load() -> Result<Self, ConfigError> {
        let token_secret = std::env::var("CORRAL_TOKEN_SECRET")
            .map_err(|_| ConfigError::Missing("CORRAL_TOKEN_SECRET"))?
            .into_bytes();

        let max_queue_per_agent = env_usize("CORRAL_MAX_QUEUE_PER_AGENT", 500)?;
        let bus = BusConfig {
            dedup_capacity: env_usize("CORRAL_DEDUP_CAPACITY", 10_000)?,
            max_queue_per_agent,
            max_high_priority_per_agent: env_usize(
                "CORRAL_MAX_HIGH_PRIORITY_PER_AGENT",
                max_queue_per_agent * 2,
            )?,
            max_sequence_gap_warnings: env_usize("CORRAL_MAX_SEQUENCE_GAP_WARNINGS", 1_000)?,
        };

        Ok(Self {
            bus,
            token_secret,
            token_ttl_ms: env_i64("CORRAL_TOKEN_TTL_MS", 3_600_000)?,
            quarantine_capacity: env_usize("CORRAL_QUARANTINE_CAPACITY", 1_000)?,
            decision_grace_period_ticks: env_u64("CORRAL_DECISION_GRACE_PERIOD_TICKS", 60)?,
            tick_interval: Duration::from_millis(env_u64("CORRAL_TICK_INTERVAL_MS", 1_000)?),
            context_injection_interval: Duration::from_millis(env_u64(
                "CORRAL_CONTEXT_INJECTION_INTERVAL_MS",
                300_000,
            )?),
            plugin_name: std::env::var("CORRAL_PLUGIN_NAME").unwrap_or_else(|_| "rpc".to_string()),
            backend_url: std::env::var("CORRAL_BACKEND_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            artifact_upload_endpoint: std::env::var("CORRAL_ARTIFACT_UPLOAD_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:8080/artifacts".to_string()),
            http_addr: std::env::var("CORRAL_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:7700".to_string()),
        })
    }
}

fn env_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn env_i64(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
