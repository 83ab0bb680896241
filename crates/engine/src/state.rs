// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory engine state
//!
//! Nothing here survives a restart; after activation the engine asks the
//! client to resend its schedule.

use crate::timers::TimerScheduler;
use chrono::NaiveDateTime;
use kusuri_core::Schedule;

#[derive(Debug, Default)]
pub struct EngineState {
    schedule: Schedule,
    timers: TimerScheduler,
    /// Whether a client has supplied a schedule since activation
    supplied: bool,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the schedule wholesale and re-arm. Returns the armed count.
    pub fn replace_schedule(&mut self, schedule: Schedule, now: NaiveDateTime) -> usize {
        self.schedule = schedule;
        self.supplied = true;
        self.timers.arm(&self.schedule, now)
    }

    /// Re-arm timers from the stored schedule
    pub fn rearm(&mut self, now: NaiveDateTime) -> usize {
        self.timers.arm(&self.schedule, now)
    }

    /// Back to the freshly-activated state
    pub fn reset(&mut self) {
        self.schedule = Schedule::default();
        self.timers.clear();
        self.supplied = false;
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn timers(&self) -> &TimerScheduler {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerScheduler {
        &mut self.timers
    }

    pub fn is_supplied(&self) -> bool {
        self.supplied
    }
}
