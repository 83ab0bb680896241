// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use kusuri_core::{Acknowledgements, ClientMessage, ControlMessage, NotificationTag, Schedule};
use kusuri_daemon::lifecycle::{Config, LifecycleError};
use kusuri_daemon::protocol::{self, ProtocolError};
use kusuri_daemon::{HostRequest, HostResponse, Request, Response, STARTUP_MARKER_PREFIX};
use serde::Serialize;
use thiserror::Error;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("KUSURI_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("KUSURI_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("KUSURI_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("KUSURI_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Paths(#[from] LifecycleError),
}

/// Daemon status as reported by `STATUS`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaemonStatus {
    pub version: String,
    pub uptime_secs: u64,
    pub scheduled: usize,
    pub timers: usize,
    pub next_fire: Option<String>,
    pub subscribers: usize,
}

impl std::fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Status: running")?;
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "Uptime: {}", format_uptime(self.uptime_secs))?;
        writeln!(f, "Reminders: {} ({} armed)", self.scheduled, self.timers)?;
        writeln!(
            f,
            "Next fire: {}",
            self.next_fire.as_deref().unwrap_or("-")
        )?;
        write!(f, "Subscribers: {}", self.subscribers)
    }
}

/// Result of a `WAKE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeSummary {
    pub due: usize,
    pub delivered: usize,
    pub rearmed: Option<usize>,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to daemon, auto-starting if not running
    pub async fn connect_or_start(config: &Config) -> Result<Self, ClientError> {
        // Restart a daemon left over from a different build
        if let Ok(daemon_version) = std::fs::read_to_string(&config.version_path) {
            if daemon_version.trim() != env!("CARGO_PKG_VERSION") {
                tracing::info!(
                    daemon = daemon_version.trim(),
                    cli = env!("CARGO_PKG_VERSION"),
                    "version mismatch, restarting daemon"
                );
                let _ = daemon_stop(config).await;
            }
        }

        match Self::connect(config) {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(config, timeout_connect(), child).await
            }
            Err(e) => Err(wrap_with_startup_error(e, &config.log_path)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        if !config.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self {
            socket_path: config.socket_path.clone(),
        })
    }

    async fn connect_with_retry(
        config: &Config,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // An early exit means startup failed; the reason is in the log
            if let Ok(Some(status)) = child.try_wait() {
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error(&config.log_path) {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    tokio::time::sleep(poll_interval()).await;
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect(config) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    tokio::time::sleep(poll_interval()).await;
                }
                Err(e) => return Err(wrap_with_startup_error(e, &config.log_path)),
            }
        }

        Err(wrap_with_startup_error(
            ClientError::DaemonStartTimeout,
            &config.log_path,
        ))
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: impl Into<Request>) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, &request.into(), timeout_ipc()).await?;
        let response = protocol::read_response(&mut reader, timeout_ipc()).await?;
        Ok(response)
    }

    /// Replace the daemon's schedule; returns the acknowledged count
    pub async fn schedule(&self, times: Schedule) -> Result<usize, ClientError> {
        match self.send(ControlMessage::Schedule { times }).await? {
            Response::Client(ClientMessage::ScheduleAck { count }) => Ok(count),
            response => Err(unexpected(response)),
        }
    }

    /// Run reconciliation once
    pub async fn check_now(
        &self,
        times: Schedule,
        checks: Acknowledgements,
    ) -> Result<(), ClientError> {
        match self.send(ControlMessage::CheckNow { times, checks }).await? {
            Response::Host(HostResponse::Ok) => Ok(()),
            response => Err(unexpected(response)),
        }
    }

    /// Liveness check; returns `(scheduled, timers)`
    pub async fn ping(&self) -> Result<(usize, usize), ClientError> {
        match self.send(ControlMessage::Ping).await? {
            Response::Client(ClientMessage::Pong { scheduled, timers }) => Ok((scheduled, timers)),
            response => Err(unexpected(response)),
        }
    }

    pub async fn wake(&self, tag: &str) -> Result<WakeSummary, ClientError> {
        match self
            .send(HostRequest::Wake {
                tag: tag.to_string(),
            })
            .await?
        {
            Response::Host(HostResponse::Woke {
                due,
                delivered,
                rearmed,
            }) => Ok(WakeSummary {
                due,
                delivered,
                rearmed,
            }),
            response => Err(unexpected(response)),
        }
    }

    pub async fn register_wake(&self, tag: &str, every: Duration) -> Result<(), ClientError> {
        match self
            .send(HostRequest::RegisterPeriodicWake {
                tag: tag.to_string(),
                interval_secs: every.as_secs(),
            })
            .await?
        {
            Response::Host(HostResponse::Ok) => Ok(()),
            response => Err(unexpected(response)),
        }
    }

    /// Report a notification tap
    pub async fn click(&self, tag: NotificationTag) -> Result<(), ClientError> {
        match self.send(HostRequest::NotificationClick { tag }).await? {
            Response::Host(HostResponse::Ok) => Ok(()),
            response => Err(unexpected(response)),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(HostRequest::Status).await? {
            Response::Host(HostResponse::Status {
                version,
                uptime_secs,
                scheduled,
                timers,
                next_fire,
                subscribers,
            }) => Ok(DaemonStatus {
                version,
                uptime_secs,
                scheduled,
                timers,
                next_fire,
                subscribers,
            }),
            response => Err(unexpected(response)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(HostRequest::Shutdown).await? {
            Response::Host(HostResponse::Ok | HostResponse::ShuttingDown) => Ok(()),
            response => Err(unexpected(response)),
        }
    }

    /// Open a long-lived connection that receives dispatcher messages
    pub async fn subscribe(&self) -> Result<Subscription, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, &HostRequest::Subscribe.into(), timeout_ipc())
            .await?;
        match protocol::read_response(&mut reader, timeout_ipc()).await? {
            Response::Host(HostResponse::Ok) => Ok(Subscription {
                reader,
                _writer: writer,
            }),
            response => Err(unexpected(response)),
        }
    }
}

/// Stream of messages pushed by the daemon after `SUBSCRIBE`
pub struct Subscription {
    reader: OwnedReadHalf,
    // Dropping the write half would half-close the connection
    _writer: OwnedWriteHalf,
}

impl Subscription {
    /// Wait for the next pushed message. Errors once the daemon goes away.
    pub async fn next(&mut self) -> Result<ClientMessage, ClientError> {
        let bytes = protocol::read_message(&mut self.reader).await?;
        match protocol::decode(&bytes)? {
            Response::Client(message) => Ok(message),
            response => Err(unexpected(response)),
        }
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Host(HostResponse::Error { message }) => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let kusurid_path = find_kusurid_binary();

    Command::new(&kusurid_path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon (graceful first, then forceful)
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(config: &Config) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(config) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            cleanup_stale_pid(&config.lock_path);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;

    if let Some(pid) = read_daemon_pid(&config.lock_path) {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    cleanup_stale_pid(&config.lock_path);
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the kusurid binary
pub fn find_kusurid_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("KUSURI_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Installed side by side with the CLI
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("kusurid");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("kusurid")
}

fn cleanup_stale_pid(pid_path: &Path) {
    if pid_path.exists() {
        let _ = std::fs::remove_file(pid_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(pid_path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(pid_path).ok()?;
    content.trim().parse::<u32>().ok()
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // kill -0 checks for existence without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Read daemon log from the last startup marker, looking for errors.
pub fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;
    startup_error_in(&content)
}

fn startup_error_in(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let messages: Vec<String> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .map(|line| {
            // "timestamp LEVEL target: message"; keep the message part
            line.split_once(": ")
                .map(|(_, msg)| msg.to_string())
                .unwrap_or_else(|| line.to_string())
        })
        .collect();

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}

/// Prefer the daemon's own startup error over a generic connection error
fn wrap_with_startup_error(err: ClientError, log_path: &Path) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(log_path) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
