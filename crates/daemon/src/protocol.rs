// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the daemon socket
//!
//! Each message is a 4-byte big-endian length followed by a JSON body.
//! A connection carries one request and one response, except `SUBSCRIBE`,
//! after which the daemon streams [`ClientMessage`]s until either side
//! hangs up.

use std::time::Duration;

use kusuri_core::{ClientMessage, ControlMessage, NotificationTag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Daemon version reported by `STATUS`
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest accepted frame
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("timed out")]
    Timeout,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message of {0} bytes exceeds limit")]
    TooLarge(usize),
}

/// Anything a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Request {
    /// Foreground-client control messages, handled by the engine
    Control(ControlMessage),
    Host(HostRequest),
}

/// Events the host runtime raises on the daemon's behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostRequest {
    /// Fire a periodic wake now
    Wake { tag: String },
    /// Register a recurring periodic wake
    RegisterPeriodicWake { tag: String, interval_secs: u64 },
    NotificationClick { tag: NotificationTag },
    /// Keep the connection open for dispatcher-originated messages
    Subscribe,
    Status,
    Shutdown,
}

impl From<ControlMessage> for Request {
    fn from(message: ControlMessage) -> Self {
        Request::Control(message)
    }
}

impl From<HostRequest> for Request {
    fn from(request: HostRequest) -> Self {
        Request::Host(request)
    }
}

/// Anything the daemon may send back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Client(ClientMessage),
    Host(HostResponse),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostResponse {
    Ok,
    Error {
        message: String,
    },
    Woke {
        due: usize,
        delivered: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rearmed: Option<usize>,
    },
    Status {
        version: String,
        uptime_secs: u64,
        scheduled: usize,
        timers: usize,
        /// Local `YYYY-MM-DD HH:MM` of the earliest armed timer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_fire: Option<String>,
        subscribers: usize,
    },
    ShuttingDown,
}

impl Response {
    pub fn ok() -> Self {
        Response::Host(HostResponse::Ok)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Host(HostResponse::Error {
            message: message.into(),
        })
    }
}

impl From<ClientMessage> for Response {
    fn from(message: ClientMessage) -> Self {
        Response::Client(message)
    }
}

impl From<HostResponse> for Response {
    fn from(response: HostResponse) -> Self {
        Response::Host(response)
    }
}

/// Serialize to JSON, without the length prefix
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed frame
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge(len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    })?;
    Ok(buf)
}

/// Write one length-prefixed frame
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge(data.len()));
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

async fn read_with_timeout<R, T>(reader: &mut R, timeout: Duration) -> Result<T, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

async fn write_with_timeout<W, T>(
    writer: &mut W,
    value: &T,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = encode(value)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    read_with_timeout(reader, timeout).await
}

pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    write_with_timeout(writer, request, timeout).await
}

pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Response, ProtocolError> {
    read_with_timeout(reader, timeout).await
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    write_with_timeout(writer, response, timeout).await
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
