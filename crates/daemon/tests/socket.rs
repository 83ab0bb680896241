// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests over a real Unix socket

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::path::{Path, PathBuf};

use kusuri_adapters::{FakeNotifyAdapter, FakeWindowAdapter, WindowCall, WindowClient};
use kusuri_core::{ClientMessage, ControlMessage, EngineConfig, FakeClock, ReminderSpec, Schedule};
use kusuri_daemon::lifecycle::{startup_with, Config};
use kusuri_daemon::protocol::{self, DEFAULT_TIMEOUT};
use kusuri_daemon::{server, DaemonState, HostRequest, HostResponse, Request, Response};
use kusuri_engine::EngineDeps;
use tempfile::TempDir;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;

type TestDaemon = DaemonState<FakeNotifyAdapter, FakeWindowAdapter, FakeClock>;

struct Harness {
    socket: PathBuf,
    notify: FakeNotifyAdapter,
    windows: FakeWindowAdapter,
    clock: FakeClock,
    handle: JoinHandle<TestDaemon>,
    _dir: TempDir,
}

async fn spawn_daemon(hour: u32, minute: u32) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = Config::for_dirs(
        dir.path().join("state"),
        dir.path().join("sock"),
        dir.path().join("config.toml"),
    );
    let notify = FakeNotifyAdapter::new();
    let windows = FakeWindowAdapter::new();
    let clock = FakeClock::at_hm(hour, minute);

    let mut daemon = startup_with(
        &config,
        EngineConfig::default(),
        EngineDeps {
            notify: notify.clone(),
            windows: windows.clone(),
        },
        clock.clone(),
    )
    .await
    .unwrap();

    let handle = tokio::spawn(async move {
        while !daemon.shutdown_requested {
            let (stream, _) = daemon.listener.accept().await.unwrap();
            // Timeouts from silent clients are expected in some tests
            let _ = server::handle_connection(&mut daemon, stream).await;
        }
        daemon
    });

    Harness {
        socket: config.socket_path,
        notify,
        windows,
        clock,
        handle,
        _dir: dir,
    }
}

async fn send(socket: &Path, request: impl Into<Request>) -> Response {
    let stream = UnixStream::connect(socket).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_request(&mut writer, &request.into(), DEFAULT_TIMEOUT)
        .await
        .unwrap();
    protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap()
}

#[tokio::test]
async fn silent_client_does_not_hold_up_others() {
    let harness = spawn_daemon(8, 0).await;

    // Connects but never sends a request
    let _silent = UnixStream::connect(&harness.socket).await.unwrap();

    let started = std::time::Instant::now();
    let response = send(&harness.socket, ControlMessage::Ping).await;
    assert!(matches!(response, Response::Client(ClientMessage::Pong { .. })));
    assert!(started.elapsed() < DEFAULT_TIMEOUT);

    stop(harness).await;
}

async fn stop(harness: Harness) -> TestDaemon {
    let response = send(&harness.socket, HostRequest::Shutdown).await;
    assert_eq!(response, Response::Host(HostResponse::ShuttingDown));
    harness.handle.await.unwrap()
}

fn schedule(entries: &[(&str, &str)]) -> ControlMessage {
    ControlMessage::Schedule {
        times: Schedule::new(
            entries
                .iter()
                .map(|(time, msg)| ReminderSpec::new(*time, *msg))
                .collect(),
        ),
    }
}

#[tokio::test]
async fn schedule_then_ping() {
    let harness = spawn_daemon(8, 0).await;

    let ack = send(&harness.socket, schedule(&[("xx:yy", "A"), ("09:00", "B")])).await;
    assert_eq!(ack, Response::Client(ClientMessage::ScheduleAck { count: 2 }));

    let pong = send(&harness.socket, ControlMessage::Ping).await;
    assert_eq!(
        pong,
        Response::Client(ClientMessage::Pong {
            scheduled: 2,
            timers: 1
        })
    );

    stop(harness).await;
}

#[tokio::test]
async fn raw_json_schedule_uses_wire_names() {
    let harness = spawn_daemon(8, 0).await;

    let stream = UnixStream::connect(&harness.socket).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    let body = br#"{"type":"SCHEDULE","times":[{"time":"09:00","msg":"Morning","medIds":[1,2]},null]}"#;
    protocol::write_message(&mut writer, body).await.unwrap();
    let reply = protocol::read_message(&mut reader).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(value, serde_json::json!({"type": "SCHEDULE_ACK", "count": 2}));

    stop(harness).await;
}

#[tokio::test]
async fn malformed_request_gets_error() {
    let harness = spawn_daemon(8, 0).await;

    let stream = UnixStream::connect(&harness.socket).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_message(&mut writer, b"{\"type\":\"NOPE\"}")
        .await
        .unwrap();
    let response = protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert!(matches!(response, Response::Host(HostResponse::Error { .. })));

    stop(harness).await;
}

#[tokio::test]
async fn subscriber_is_asked_to_reschedule_until_schedule_arrives() {
    let harness = spawn_daemon(8, 0).await;

    let stream = UnixStream::connect(&harness.socket).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_request(&mut writer, &HostRequest::Subscribe.into(), DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let first = protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(first, Response::ok());
    let second = protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(second, Response::Client(ClientMessage::RequestReschedule));

    send(&harness.socket, schedule(&[("09:00", "A")])).await;

    // A later subscriber is not asked again
    let stream = UnixStream::connect(&harness.socket).await.unwrap();
    let (mut late_reader, mut late_writer) = stream.into_split();
    protocol::write_request(&mut late_writer, &HostRequest::Subscribe.into(), DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let first = protocol::read_response(&mut late_reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(first, Response::ok());
    let nothing = protocol::read_response(&mut late_reader, std::time::Duration::from_millis(50)).await;
    assert!(matches!(nothing, Err(protocol::ProtocolError::Timeout)));

    let status = send(&harness.socket, HostRequest::Status).await;
    let Response::Host(HostResponse::Status { subscribers, .. }) = status else {
        panic!("expected STATUS, got {status:?}");
    };
    assert_eq!(subscribers, 2);

    let daemon = stop(harness).await;
    assert_eq!(daemon.broadcast(ClientMessage::RequestReschedule), 2);
    let pushed = protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(pushed, Response::Client(ClientMessage::RequestReschedule));
}

#[tokio::test]
async fn wake_delivers_due_reminders() {
    let harness = spawn_daemon(8, 0).await;
    send(&harness.socket, schedule(&[("09:00", "Morning")])).await;

    harness.clock.set_hm(9, 10);
    let woke = send(
        &harness.socket,
        HostRequest::Wake {
            tag: "kusuri-check".to_string(),
        },
    )
    .await;
    assert_eq!(
        woke,
        Response::Host(HostResponse::Woke {
            due: 1,
            delivered: 1,
            rearmed: None
        })
    );

    let notify = harness.notify.clone();
    let daemon = stop(harness).await;
    daemon.engine.lifetime().drained().await;
    assert_eq!(notify.bodies(), vec!["Morning"]);
}

#[tokio::test]
async fn click_focuses_app_window() {
    let harness = spawn_daemon(8, 0).await;
    harness
        .windows
        .add_client(WindowClient::new("w1", "http://localhost:8080/index.html"));

    let response = send(
        &harness.socket,
        HostRequest::NotificationClick {
            tag: "09:00".into(),
        },
    )
    .await;
    assert_eq!(response, Response::ok());

    let windows = harness.windows.clone();
    let daemon = stop(harness).await;
    daemon.engine.lifetime().drained().await;
    assert_eq!(
        windows.calls(),
        vec![WindowCall::Focus {
            id: "w1".to_string()
        }]
    );
}

#[tokio::test]
async fn shutdown_cleans_up_files() {
    let harness = spawn_daemon(8, 0).await;
    let mut daemon = stop(harness).await;
    let socket = daemon.config.socket_path.clone();
    let pid = daemon.config.lock_path.clone();

    daemon.shutdown().await.unwrap();
    assert!(!socket.exists());
    assert!(!pid.exists());
}
