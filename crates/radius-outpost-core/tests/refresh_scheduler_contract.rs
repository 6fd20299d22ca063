//! Contract Test: Refresh Scheduling
//!
//! This test verifies the periodic refresh loop.
//!
//! Constraints verified:
//! - The first refresh happens immediately
//! - Subsequent refreshes follow the configured interval
//! - A failed refresh keeps the loop alive and the old set active
//! - Shutdown stops the loop
//! - Shutdown does not wait for an in-flight fetch
//!
//! If this test fails, someone has added:
//! - A loop that exits on refresh errors
//! - Refreshes outside the schedule
//! - A fetch that blocks shutdown until its deadline

mod common;

use common::*;
use radius_outpost_core::{Error, ProviderDirectory, RefreshConfig, RefreshEvent, RefreshScheduler};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

fn config() -> RefreshConfig {
    RefreshConfig {
        interval_secs: 60,
        timeout_secs: 10,
    }
}

#[tokio::test(start_paused = true)]
async fn refreshes_immediately_then_on_interval() {
    let directory = Arc::new(ProviderDirectory::new());
    let source = Arc::new(ScriptedSource::fixed(vec![provider("vpn", "s1", "10.0.0.0/24")]));

    let (scheduler, mut events) =
        RefreshScheduler::new(directory.clone(), source.clone(), &config()).unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    assert!(matches!(events.recv().await, Some(RefreshEvent::Refreshed(_))));
    assert_eq!(source.call_count(), 1);
    assert!(directory.lookup(ip("10.0.0.1")).is_some());

    assert!(matches!(events.recv().await, Some(RefreshEvent::Refreshed(_))));
    assert_eq!(source.call_count(), 2);

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
    assert_eq!(events.recv().await, Some(RefreshEvent::Stopped));
}

#[tokio::test(start_paused = true)]
async fn failures_keep_loop_running_and_old_set_active() {
    let directory = Arc::new(ProviderDirectory::new());
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(vec![provider("vpn", "s1", "10.0.0.0/24")]),
        Err(Error::config_source("connection reset")),
        Ok(Vec::new()),
        Ok(vec![provider("vpn", "s2", "10.0.0.0/24")]),
    ]));

    let (scheduler, mut events) =
        RefreshScheduler::new(directory.clone(), source.clone(), &config()).unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    assert!(matches!(events.recv().await, Some(RefreshEvent::Refreshed(_))));

    match events.recv().await {
        Some(RefreshEvent::Failed { error }) => assert!(error.contains("connection reset")),
        other => panic!("expected fetch failure, got {:?}", other),
    }
    assert_eq!(
        directory.lookup(ip("10.0.0.1")).unwrap().provider.shared_secret().as_bytes(),
        b"s1"
    );

    match events.recv().await {
        Some(RefreshEvent::Failed { error }) => assert_eq!(error, "no radius provider defined"),
        other => panic!("expected empty-set failure, got {:?}", other),
    }
    assert_eq!(
        directory.lookup(ip("10.0.0.1")).unwrap().provider.shared_secret().as_bytes(),
        b"s1"
    );

    assert!(matches!(events.recv().await, Some(RefreshEvent::Refreshed(_))));
    assert_eq!(
        directory.lookup(ip("10.0.0.1")).unwrap().provider.shared_secret().as_bytes(),
        b"s2"
    );

    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn hung_fetch_times_out_and_loop_continues() {
    let directory = Arc::new(ProviderDirectory::new());
    let source = Arc::new(GatedSource::new(vec![provider("vpn", "s1", "10.0.0.0/24")]));

    let (scheduler, mut events) =
        RefreshScheduler::new(directory.clone(), source.clone(), &config()).unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    match events.recv().await {
        Some(RefreshEvent::Failed { error }) => assert!(error.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(directory.is_empty());

    // Next tick still fires
    match events.recv().await {
        Some(RefreshEvent::Failed { .. }) => {}
        other => panic!("expected second attempt, got {:?}", other),
    }

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(30), handle)
        .await
        .expect("scheduler stops")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_interrupts_in_flight_fetch() {
    let directory = Arc::new(ProviderDirectory::new());
    let source = Arc::new(GatedSource::new(vec![provider("vpn", "s1", "10.0.0.0/24")]));
    let entered = source.entered();

    let (scheduler, mut events) =
        RefreshScheduler::new(directory.clone(), source.clone(), &config()).unwrap();
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let handle = tokio::spawn(async move { scheduler.run_with_shutdown(Some(shutdown_rx)).await });

    // The first fetch is now blocked on its gate
    entered.notified().await;

    let started = tokio::time::Instant::now();
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let waited = started.elapsed();
    assert!(waited < Duration::from_secs(1), "shutdown waited {:?}", waited);
    assert!(directory.is_empty(), "an abandoned fetch publishes nothing");
    assert_eq!(events.recv().await, Some(RefreshEvent::Stopped));
}
