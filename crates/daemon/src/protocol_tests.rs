// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;
use kusuri_core::{ReminderSpec, Schedule};
use serde_json::json;

#[test]
fn control_messages_decode_as_control_requests() {
    let bytes = br#"{"type":"SCHEDULE","times":[{"time":"09:00","msg":"Take A","medIds":[1,"b"]}]}"#;
    let request: Request = decode(bytes).expect("decode failed");

    let Request::Control(ControlMessage::Schedule { times }) = request else {
        panic!("expected SCHEDULE, got {request:?}");
    };
    assert_eq!(times.len(), 1);
    assert_eq!(times.entries()[0].message, "Take A");
    assert_eq!(times.entries()[0].item_ids.len(), 2);
}

#[test]
fn ping_decodes_as_control() {
    let request: Request = decode(br#"{"type":"PING"}"#).unwrap();
    assert_eq!(request, Request::Control(ControlMessage::Ping));
}

#[test]
fn host_requests_decode_as_host() {
    let request: Request =
        decode(br#"{"type":"REGISTER_PERIODIC_WAKE","tag":"kusuri-check","interval_secs":1800}"#)
            .unwrap();
    assert_eq!(
        request,
        Request::Host(HostRequest::RegisterPeriodicWake {
            tag: "kusuri-check".to_string(),
            interval_secs: 1800,
        })
    );

    let request: Request = decode(br#"{"type":"SUBSCRIBE"}"#).unwrap();
    assert_eq!(request, Request::Host(HostRequest::Subscribe));
}

#[test]
fn unknown_request_type_is_rejected() {
    let result: Result<Request, _> = decode(br#"{"type":"REBOOT"}"#);
    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[test]
fn client_messages_keep_wire_names() {
    let encoded = encode(&Response::from(ClientMessage::ScheduleAck { count: 2 })).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(value, json!({"type": "SCHEDULE_ACK", "count": 2}));

    let encoded = encode(&Response::from(ClientMessage::Pong {
        scheduled: 3,
        timers: 2,
    }))
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(value, json!({"type": "PONG", "scheduled": 3, "timers": 2}));

    let encoded = encode(&Response::from(ClientMessage::RequestReschedule)).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(value, json!({"type": "REQUEST_RESCHEDULE"}));
}

#[test]
fn host_responses_encode_with_type_tag() {
    let encoded = encode(&Response::ok()).unwrap();
    assert_eq!(std::str::from_utf8(&encoded).unwrap(), r#"{"type":"OK"}"#);

    let encoded = encode(&Response::from(HostResponse::Woke {
        due: 1,
        delivered: 0,
        rearmed: None,
    }))
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(value, json!({"type": "WOKE", "due": 1, "delivered": 0}));
}

#[test]
fn status_response_decodes_as_host() {
    let response = Response::from(HostResponse::Status {
        version: "0.1.0".to_string(),
        uptime_secs: 3600,
        scheduled: 2,
        timers: 2,
        next_fire: Some("2026-01-01 09:00".to_string()),
        subscribers: 1,
    });

    let encoded = encode(&response).expect("encode failed");
    let decoded: Response = decode(&encoded).expect("decode failed");
    assert_eq!(response, decoded);
}

#[test]
fn schedule_request_encodes_canonical_field_names() {
    let request = Request::from(ControlMessage::Schedule {
        times: Schedule::new(vec![ReminderSpec::new("09:00", "Take A").with_items(["a"])]),
    });
    let encoded = encode(&request).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(
        value,
        json!({"type": "SCHEDULE", "times": [{"time": "09:00", "msg": "Take A", "medIds": ["a"]}]})
    );
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    // write_message adds 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data)
        .await
        .expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_on_empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let result = read_message(&mut cursor).await;
    assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
}

#[tokio::test]
async fn read_message_rejects_oversized_frame() {
    let mut buffer = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
    buffer.extend_from_slice(b"{}");
    let mut cursor = std::io::Cursor::new(buffer);

    let result = read_message(&mut cursor).await;
    assert!(matches!(result, Err(ProtocolError::TooLarge(_))));
}

#[tokio::test]
async fn request_response_over_duplex() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    write_request(&mut client, &Request::from(ControlMessage::Ping), DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let request = read_request(&mut server, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(request, Request::Control(ControlMessage::Ping));

    let pong = Response::from(ClientMessage::Pong {
        scheduled: 0,
        timers: 0,
    });
    write_response(&mut server, &pong, DEFAULT_TIMEOUT).await.unwrap();
    assert_eq!(read_response(&mut client, DEFAULT_TIMEOUT).await.unwrap(), pong);
}

#[tokio::test]
async fn read_request_times_out() {
    let (_client, mut server) = tokio::io::duplex(64);
    let result = read_request(&mut server, Duration::from_millis(20)).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}
