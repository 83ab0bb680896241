// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kusuri-daemon: host runtime for the reminder engine
//!
//! Owns the socket, the periodic-wake registry, and the process lifecycle.
//! The `kusurid` binary drives these from a single-threaded event loop.

pub mod lifecycle;
pub mod periodic;
pub mod protocol;
pub mod server;

pub use lifecycle::{Config, DaemonState, LifecycleError, SystemDaemon};
pub use protocol::{HostRequest, HostResponse, ProtocolError, Request, Response};
pub use server::ServerError;

/// Startup marker prefix written to log before anything else.
/// Clients use this to find where the current startup attempt begins.
/// Full format: "--- kusurid: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- kusurid: starting (pid: ";
