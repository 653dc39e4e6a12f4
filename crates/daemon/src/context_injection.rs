// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background context refresh, started and stopped as its own
//! lifecycle stage per spec §5's shutdown sequence ("stop the tick service,
//! stop context injection, ..."). The spec leaves the injection payload
//! itself unspecified beyond the aggregating plugin's `injectContext`
//! operation (§4.10/§4.11); this is a thin scheduler around it, mirroring
//! the shape of `corral_core::TickService`'s start/stop pair.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub type InjectionTick = Box<dyn Fn() + Send + Sync>;

struct Inner {
    running: AtomicBool,
    shutdown: Notify,
}

/// Drives a periodic callback (typically a round of `inject_context` calls
/// across live agents) on a fixed interval until stopped.
#[derive(Clone)]
pub struct ContextInjectionScheduler {
    inner: Arc<Inner>,
    interval: Duration,
}

impl ContextInjectionScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            interval,
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Start the background loop, invoking `on_tick` once per interval.
    /// No-op if already running.
    pub fn start(&self, on_tick: InjectionTick) -> Option<JoinHandle<()>> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let inner = self.inner.clone();
        let interval = self.interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => on_tick(),
                    _ = inner.shutdown.notified() => break,
                }
            }
        }))
    }

    pub fn stop(&self) {
        if self
            .inner
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.inner.shutdown.notify_waiters();
        }
    }
}

#[cfg(test)]
#[path = "context_injection_tests.rs"]
mod tests;
