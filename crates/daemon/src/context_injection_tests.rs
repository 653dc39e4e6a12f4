// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::AtomicUsize;

#[tokio::test]
async fn ticks_fire_on_the_configured_interval() {
    let scheduler = ContextInjectionScheduler::new(Duration::from_millis(10));
    let count = Arc::new(AtomicUsize::new(0));
    let count2 = count.clone();
    let handle = scheduler.start(Box::new(move || {
        count2.fetch_add(1, Ordering::SeqCst);
    }));
    assert!(handle.is_some());

    tokio::time::sleep(Duration::from_millis(55)).await;
    scheduler.stop();
    assert!(count.load(Ordering::SeqCst) >= 3);
}

#[tokio::test]
async fn starting_twice_is_a_no_op() {
    let scheduler = ContextInjectionScheduler::new(Duration::from_secs(60));
    assert!(scheduler.start(Box::new(|| {})).is_some());
    assert!(scheduler.start(Box::new(|| {})).is_none());
    scheduler.stop();
}

#[tokio::test]
async fn stop_halts_further_ticks() {
    let scheduler = ContextInjectionScheduler::new(Duration::from_millis(10));
    let count = Arc::new(AtomicUsize::new(0));
    let count2 = count.clone();
    scheduler.start(Box::new(move || {
        count2.fetch_add(1, Ordering::SeqCst);
    }));
    tokio::time::sleep(Duration::from_millis(25)).await;
    scheduler.stop();
    let after_stop = count.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(count.load(Ordering::SeqCst), after_stop);
}
