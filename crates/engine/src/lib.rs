// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kusuri reminder engine
//!
//! Arms daily wake-ups for each reminder, reconciles what is due when a
//! coarse periodic wake arrives, and issues de-duplicated notifications.

mod delivery;
mod error;
mod lifetime;
mod reconcile;
mod runtime;
mod state;
mod timers;

pub use delivery::{Delivery, DeliveryOutcome, DeliverySink, Repeats};
pub use error::EngineError;
pub use lifetime::{Lifetime, LifetimeGuard};
pub use reconcile::{DueReminder, WindowReconciler};
pub use runtime::{focus_or_open, Engine, EngineDeps, WakeReport, WindowAction};
pub use state::EngineState;
pub use timers::{ArmedTimer, FiredTimer, TimerEvent, TimerId, TimerScheduler, TimerState};
