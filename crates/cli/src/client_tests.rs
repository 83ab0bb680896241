// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for daemon client behavior.

use super::*;
use kusuri_adapters::{FakeNotifyAdapter, FakeWindowAdapter};
use kusuri_core::{EngineConfig, FakeClock, ReminderSpec};
use kusuri_daemon::lifecycle::startup_with;
use kusuri_daemon::{server, DaemonState};
use kusuri_engine::EngineDeps;
use std::fs;
use tempfile::{tempdir, TempDir};
use tokio::task::JoinHandle;

type TestDaemon = DaemonState<FakeNotifyAdapter, FakeWindowAdapter, FakeClock>;

fn test_config(dir: &TempDir) -> Config {
    Config::for_dirs(
        dir.path().join("state"),
        dir.path().join("sock"),
        dir.path().join("config.toml"),
    )
}

/// Serve connections in-process until a SHUTDOWN arrives
async fn serve(config: &Config, clock: FakeClock) -> JoinHandle<TestDaemon> {
    let mut daemon = startup_with(
        config,
        EngineConfig::default(),
        EngineDeps {
            notify: FakeNotifyAdapter::new(),
            windows: FakeWindowAdapter::new(),
        },
        clock,
    )
    .await
    .unwrap();

    tokio::spawn(async move {
        while !daemon.shutdown_requested {
            let (stream, _) = daemon.listener.accept().await.unwrap();
            server::handle_connection(&mut daemon, stream).await.unwrap();
        }
        daemon
    })
}

/// Verify that connect() does not delete state files when daemon is not running.
///
/// The pid file may belong to a daemon that is still initializing.
#[test]
fn connect_does_not_delete_pid_file() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);

    fs::create_dir_all(&config.state_dir).unwrap();
    fs::write(&config.lock_path, "12345\n").unwrap();

    let result = DaemonClient::connect(&config);
    assert!(matches!(result, Err(ClientError::DaemonNotRunning)));
    assert!(config.lock_path.exists(), "connect() must not delete pid file");
}

#[test]
fn startup_error_is_read_from_last_marker() {
    let log = format!(
        "{p}1) ---\nERROR Failed to start daemon: old failure\n\
         {p}2) ---\n2026-01-01T00:00:00Z  INFO kusurid: Starting kusurid\n\
         ERROR Failed to start daemon: Failed to acquire lock: busy\n",
        p = STARTUP_MARKER_PREFIX
    );
    assert_eq!(
        startup_error_in(&log).as_deref(),
        Some("Failed to acquire lock: busy")
    );
}

#[test]
fn clean_startup_has_no_error() {
    let log = format!(
        "{}7) ---\n2026-01-01T00:00:00Z  INFO kusurid: Daemon ready\n",
        STARTUP_MARKER_PREFIX
    );
    assert_eq!(startup_error_in(&log), None);
    assert_eq!(startup_error_in("no marker at all"), None);
}

#[test]
fn pid_file_parsing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("daemon.pid");
    assert_eq!(read_daemon_pid(&path), None);

    fs::write(&path, "4242\n").unwrap();
    assert_eq!(read_daemon_pid(&path), Some(4242));

    fs::write(&path, "garbage").unwrap();
    assert_eq!(read_daemon_pid(&path), None);
}

#[test]
fn uptime_formatting() {
    assert_eq!(format_uptime(5), "5s");
    assert_eq!(format_uptime(65), "1m 5s");
    assert_eq!(format_uptime(3 * 3600 + 120), "3h 2m");
}

#[test]
fn status_display_lists_fields() {
    let status = DaemonStatus {
        version: "0.1.0".to_string(),
        uptime_secs: 61,
        scheduled: 3,
        timers: 2,
        next_fire: Some("2026-01-01 09:00".to_string()),
        subscribers: 1,
    };
    let text = status.to_string();
    assert!(text.contains("Reminders: 3 (2 armed)"));
    assert!(text.contains("Next fire: 2026-01-01 09:00"));
    assert!(text.contains("Uptime: 1m 1s"));
}

#[tokio::test]
async fn round_trips_against_live_daemon() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let handle = serve(&config, FakeClock::at_hm(8, 0)).await;
    let client = DaemonClient::connect(&config).unwrap();

    let times = Schedule::new(vec![
        ReminderSpec::new("09:00", "Morning"),
        ReminderSpec::new("nope", "Broken"),
    ]);
    assert_eq!(client.schedule(times).await.unwrap(), 2);
    assert_eq!(client.ping().await.unwrap(), (2, 1));

    let status = client.status().await.unwrap();
    assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(status.next_fire.as_deref(), Some("2026-01-01 09:00"));

    client.shutdown().await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn wake_and_register_report_results() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let clock = FakeClock::at_hm(8, 0);
    let handle = serve(&config, clock.clone()).await;
    let client = DaemonClient::connect(&config).unwrap();

    client
        .schedule(Schedule::new(vec![ReminderSpec::new("09:00", "Morning")]))
        .await
        .unwrap();
    clock.set_hm(9, 2);

    let summary = client.wake("kusuri-check").await.unwrap();
    assert_eq!(
        summary,
        WakeSummary {
            due: 1,
            delivered: 1,
            rearmed: None
        }
    );

    client
        .register_wake("kusuri-check", Duration::from_secs(600))
        .await
        .unwrap();
    let rejected = client.register_wake("kusuri-check", Duration::ZERO).await;
    assert!(matches!(rejected, Err(ClientError::Rejected(_))));

    client.shutdown().await.unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn subscription_receives_reschedule_request() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    let handle = serve(&config, FakeClock::new()).await;
    let client = DaemonClient::connect(&config).unwrap();

    // No schedule yet, so the daemon asks for one straight away
    let mut subscription = client.subscribe().await.unwrap();
    assert_eq!(
        subscription.next().await.unwrap(),
        ClientMessage::RequestReschedule
    );

    client.shutdown().await.unwrap();
    let daemon = handle.await.unwrap();
    drop(daemon);

    // Daemon gone: the stream ends with an error rather than hanging
    assert!(subscription.next().await.is_err());
}

#[tokio::test]
async fn stop_when_not_running_cleans_stale_pid() {
    let dir = tempdir().unwrap();
    let config = test_config(&dir);
    fs::create_dir_all(&config.state_dir).unwrap();
    fs::write(&config.lock_path, "999999\n").unwrap();

    assert!(!daemon_stop(&config).await.unwrap());
    assert!(!config.lock_path.exists());
}
