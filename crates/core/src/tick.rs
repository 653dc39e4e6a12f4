// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic logical tick service driving the decision queue's grace period
//! and anything else that wants coarse, testable time.

use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub type TickHandler = Box<dyn Fn(u64) + Send + Sync>;

/// How the tick service advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// A background worker increments the tick on a fixed interval.
    WallClock(Duration),
    /// The tick advances only when `advance()` is called explicitly (tests).
    Manual,
}

struct Inner {
    tick: AtomicU64,
    handlers: Mutex<Vec<TickHandler>>,
    running: AtomicBool,
    shutdown: Notify,
}

/// Monotonic 64-bit tick counter starting at 0.
#[derive(Clone)]
pub struct TickService {
    inner: Arc<Inner>,
    mode: TickMode,
}

impl TickService {
    pub fn new(mode: TickMode) -> Self {
        Self {
            inner: Arc::new(Inner {
                tick: AtomicU64::new(0),
                handlers: Mutex::new(Vec::new()),
                running: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            mode,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.inner.tick.load(Ordering::SeqCst)
    }

    /// Advance the tick by one and fan out to subscribers in registration
    /// order. A panicking handler is caught and logged; it never prevents
    /// later handlers from observing this tick.
    pub fn advance(&self) -> u64 {
        let new_tick = self.inner.tick.fetch_add(1, Ordering::SeqCst) + 1;
        let handlers = self.inner.handlers.lock();
        for handler in handlers.iter() {
            if std::panic::catch_unwind(AssertUnwindSafe(|| handler(new_tick))).is_err() {
                tracing::warn!(tick = new_tick, "tick handler panicked, continuing");
            }
        }
        new_tick
    }

    /// Register a handler invoked after every increment. Handlers must be
    /// non-blocking; they run synchronously on the thread that calls
    /// `advance()`.
    pub fn subscribe_to(&self, handler: TickHandler) {
        self.inner.handlers.lock().push(handler);
    }

    /// Start the background worker for `WallClock` mode. No-op for `Manual`
    /// mode or if already started.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let TickMode::WallClock(interval) = self.mode else {
            return None;
        };
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let this = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        this.advance();
                    }
                    _ = this.inner.shutdown.notified() => {
                        break;
                    }
                }
            }
        }))
    }

    /// Stop the background worker. No-op in `Manual` mode.
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
#[path = "tick_tests.rs"]
mod tests;
