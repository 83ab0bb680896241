// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use std::time::Duration;

use kusuri_adapters::{NotifyAdapter, WindowAdapter};
use kusuri_core::{ClientMessage, Clock};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::lifecycle::DaemonState;
use crate::protocol::{
    self, HostRequest, HostResponse, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};

/// How long a new connection may take to send its request. Connections are
/// served on the event loop, so this bounds how long a silent client can
/// hold up timers.
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Handle a single client connection
pub async fn handle_connection<N, W, C>(
    daemon: &mut DaemonState<N, W, C>,
    stream: UnixStream,
) -> Result<(), ServerError>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, REQUEST_READ_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            warn!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(protocol::ProtocolError::Json(e)) => {
            warn!("Malformed request: {}", e);
            let response = Response::error(format!("malformed request: {e}"));
            protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    if request == Request::Host(HostRequest::Subscribe) {
        return subscribe(daemon, writer).await;
    }

    // Handle request
    let response = handle_request(daemon, request);

    debug!("Sending response: {:?}", response);

    // Write response with timeout
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub fn handle_request<N, W, C>(daemon: &mut DaemonState<N, W, C>, request: Request) -> Response
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    match request {
        // Control messages that need no reply still get an acknowledgement
        // so request/response clients are not left waiting
        Request::Control(message) => match daemon.engine.on_message(message) {
            Some(reply) => Response::Client(reply),
            None => Response::ok(),
        },

        Request::Host(HostRequest::Wake { tag }) => {
            let report = daemon.periodic_wake(&tag);
            HostResponse::Woke {
                due: report.due,
                delivered: report.delivered,
                rearmed: report.rearmed,
            }
            .into()
        }

        Request::Host(HostRequest::RegisterPeriodicWake { tag, interval_secs }) => {
            match daemon.register_periodic(tag, Duration::from_secs(interval_secs)) {
                Ok(()) => Response::ok(),
                Err(e) => Response::error(e.to_string()),
            }
        }

        Request::Host(HostRequest::NotificationClick { tag }) => {
            daemon.engine.on_notification_click(&tag);
            Response::ok()
        }

        // Only reachable if called directly; connections divert earlier
        Request::Host(HostRequest::Subscribe) => {
            Response::error("SUBSCRIBE requires a dedicated connection")
        }

        Request::Host(HostRequest::Status) => {
            let state = daemon.engine.state();
            HostResponse::Status {
                version: PROTOCOL_VERSION.to_string(),
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                scheduled: state.schedule().len(),
                timers: state.timers().armed_count(),
                next_fire: daemon
                    .engine
                    .next_deadline()
                    .map(|at| at.format("%Y-%m-%d %H:%M").to_string()),
                subscribers: daemon.subscriber_count(),
            }
            .into()
        }

        Request::Host(HostRequest::Shutdown) => {
            daemon.shutdown_requested = true;
            HostResponse::ShuttingDown.into()
        }
    }
}

/// Hand the connection to a writer task fed by the daemon's broadcast
/// channel. The first frame is `OK`, optionally followed by an immediate
/// `REQUEST_RESCHEDULE` if the engine still has no schedule.
async fn subscribe<N, W, C>(
    daemon: &mut DaemonState<N, W, C>,
    mut writer: OwnedWriteHalf,
) -> Result<(), ServerError>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    let id = Uuid::new_v4();
    let rx = daemon.subscribers.subscribe();

    protocol::write_response(&mut writer, &Response::ok(), DEFAULT_TIMEOUT).await?;
    if let Some(message) = daemon.engine.on_client_connected() {
        protocol::write_response(&mut writer, &Response::Client(message), DEFAULT_TIMEOUT)
            .await?;
    }

    info!(%id, "client subscribed");
    tokio::spawn(forward(id, rx, writer));
    Ok(())
}

async fn forward(id: Uuid, mut rx: broadcast::Receiver<ClientMessage>, mut writer: OwnedWriteHalf) {
    loop {
        let message = match rx.recv().await {
            Ok(message) => message,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(%id, skipped, "subscriber lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let response = Response::Client(message);
        if let Err(e) = protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await {
            debug!(%id, error = %e, "subscriber gone");
            break;
        }
    }
    info!(%id, "client unsubscribed");
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
