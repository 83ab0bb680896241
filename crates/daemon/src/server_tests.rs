// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::{startup_with, Config};
use kusuri_adapters::{FakeNotifyAdapter, FakeWindowAdapter};
use kusuri_core::{
    Acknowledgements, ControlMessage, EngineConfig, FakeClock, NotificationTag, ReminderSpec,
    Schedule,
};
use kusuri_engine::EngineDeps;
use std::time::Instant;
use tempfile::TempDir;
use tokio::net::UnixStream;

struct TestContext {
    daemon: DaemonState<FakeNotifyAdapter, FakeWindowAdapter, FakeClock>,
    notify: FakeNotifyAdapter,
    clock: FakeClock,
    _dir: TempDir,
}

async fn setup(hour: u32, minute: u32) -> TestContext {
    let dir = TempDir::new().unwrap();
    let config = Config::for_dirs(
        dir.path().join("state"),
        dir.path().join("sock"),
        dir.path().join("config.toml"),
    );
    let notify = FakeNotifyAdapter::new();
    let clock = FakeClock::at_hm(hour, minute);
    let daemon = startup_with(
        &config,
        EngineConfig::default(),
        EngineDeps {
            notify: notify.clone(),
            windows: FakeWindowAdapter::new(),
        },
        clock.clone(),
    )
    .await
    .unwrap();
    TestContext {
        daemon,
        notify,
        clock,
        _dir: dir,
    }
}

fn schedule_request(entries: &[(&str, &str)]) -> Request {
    let times = entries
        .iter()
        .map(|(time, msg)| ReminderSpec::new(*time, *msg))
        .collect::<Vec<_>>();
    Request::Control(ControlMessage::Schedule {
        times: Schedule::new(times),
    })
}

#[tokio::test]
async fn schedule_replies_with_ack() {
    let mut ctx = setup(8, 0).await;
    let response = handle_request(&mut ctx.daemon, schedule_request(&[("09:00", "A")]));
    assert_eq!(
        response,
        Response::Client(ClientMessage::ScheduleAck { count: 1 })
    );
}

#[tokio::test]
async fn check_now_replies_ok() {
    let mut ctx = setup(9, 0).await;
    let request = Request::Control(ControlMessage::CheckNow {
        times: Schedule::new(vec![ReminderSpec::new("09:00", "A")]),
        checks: Acknowledgements::new(),
    });
    assert_eq!(handle_request(&mut ctx.daemon, request), Response::ok());

    ctx.daemon.engine.lifetime().drained().await;
    assert_eq!(ctx.notify.bodies(), vec!["A"]);
}

#[tokio::test]
async fn wake_reports_reconciliation() {
    let mut ctx = setup(8, 0).await;
    handle_request(&mut ctx.daemon, schedule_request(&[("09:00", "A")]));
    ctx.clock.set_hm(9, 4);

    let response = handle_request(
        &mut ctx.daemon,
        Request::Host(HostRequest::Wake {
            tag: "kusuri-check".to_string(),
        }),
    );
    assert_eq!(
        response,
        Response::Host(HostResponse::Woke {
            due: 1,
            delivered: 1,
            rearmed: None
        })
    );
}

#[tokio::test]
async fn register_periodic_wake_is_recorded() {
    let mut ctx = setup(8, 0).await;
    let response = handle_request(
        &mut ctx.daemon,
        Request::Host(HostRequest::RegisterPeriodicWake {
            tag: "kusuri-check".to_string(),
            interval_secs: 900,
        }),
    );
    assert_eq!(response, Response::ok());
    assert_eq!(
        ctx.daemon.periodic.interval("kusuri-check"),
        Some(Duration::from_secs(900))
    );

    let response = handle_request(
        &mut ctx.daemon,
        Request::Host(HostRequest::RegisterPeriodicWake {
            tag: "kusuri-check".to_string(),
            interval_secs: 0,
        }),
    );
    assert!(matches!(response, Response::Host(HostResponse::Error { .. })));
}

#[tokio::test]
async fn status_reports_schedule_and_next_fire() {
    let mut ctx = setup(8, 0).await;
    handle_request(
        &mut ctx.daemon,
        schedule_request(&[("09:00", "A"), ("bad", "B")]),
    );

    let response = handle_request(&mut ctx.daemon, Request::Host(HostRequest::Status));
    let Response::Host(HostResponse::Status {
        version,
        scheduled,
        timers,
        next_fire,
        subscribers,
        ..
    }) = response
    else {
        panic!("expected STATUS, got {response:?}");
    };
    assert_eq!(version, PROTOCOL_VERSION);
    assert_eq!((scheduled, timers, subscribers), (2, 1, 0));
    assert_eq!(next_fire.as_deref(), Some("2026-01-01 09:00"));
}

#[tokio::test]
async fn notification_click_replies_ok() {
    let mut ctx = setup(8, 0).await;
    let response = handle_request(
        &mut ctx.daemon,
        Request::Host(HostRequest::NotificationClick {
            tag: NotificationTag::from("09:00"),
        }),
    );
    assert_eq!(response, Response::ok());
}

#[tokio::test]
async fn shutdown_sets_flag() {
    let mut ctx = setup(8, 0).await;
    let response = handle_request(&mut ctx.daemon, Request::Host(HostRequest::Shutdown));
    assert_eq!(response, Response::Host(HostResponse::ShuttingDown));
    assert!(ctx.daemon.shutdown_requested);
}

#[tokio::test]
async fn silent_connection_times_out_quickly() {
    let mut ctx = setup(8, 0).await;
    let (server_end, _client_end) = UnixStream::pair().unwrap();

    let started = Instant::now();
    let result = handle_connection(&mut ctx.daemon, server_end).await;
    assert!(matches!(result, Err(ServerError::Timeout)));
    assert!(started.elapsed() >= REQUEST_READ_TIMEOUT);
    assert!(started.elapsed() < DEFAULT_TIMEOUT);
}
