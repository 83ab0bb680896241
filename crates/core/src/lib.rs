// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kusuri-core: Core types for the kusuri reminder daemon
//!
//! This crate provides:
//! - A wall-clock abstraction with a controllable fake
//! - The reminder schedule model and time-of-day arithmetic
//! - Acknowledgement state reported by the client
//! - Notification payloads and engine configuration
//! - Control-channel message types

pub mod acknowledgement;
pub mod clock;
pub mod config;
pub mod message;
pub mod notification;
pub mod reminder;
pub mod time_of_day;

pub use acknowledgement::{AckLedger, Acknowledgements};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use message::{ClientMessage, ControlMessage};
pub use notification::{Notification, NotificationTag, NotificationTemplate, Renotify};
pub use reminder::{ItemId, ReminderSpec, Schedule};
pub use time_of_day::{TimeOfDay, TimeParseError};
