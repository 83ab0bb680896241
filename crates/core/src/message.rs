// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel messages exchanged with the foreground client
//!
//! The `type` discriminator and field names are the compatibility contract
//! with existing clients and must not change.

use crate::acknowledgement::Acknowledgements;
use crate::reminder::Schedule;
use serde::{Deserialize, Serialize};

/// Messages a client sends to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Replace the schedule and re-arm all timers
    Schedule {
        #[serde(default)]
        times: Schedule,
    },
    /// Run reconciliation once against the given reminders
    CheckNow {
        #[serde(default)]
        times: Schedule,
        #[serde(default)]
        checks: Acknowledgements,
    },
    /// Liveness check
    Ping,
}

impl ControlMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Schedule { .. } => "SCHEDULE",
            ControlMessage::CheckNow { .. } => "CHECK_NOW",
            ControlMessage::Ping => "PING",
        }
    }
}

/// Messages the engine sends to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    ScheduleAck { count: usize },
    Pong { scheduled: usize, timers: usize },
    /// Ask the client to resend its schedule
    RequestReschedule,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
