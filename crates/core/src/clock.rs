// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable wall-clock handling
//!
//! Reminders are expressed in local time-of-day, so the engine reasons in
//! naive local date-times. Converting a target back into a real sleep
//! duration is the clock's job, because only the system clock knows the
//! time zone rules in force.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A clock that provides the current local wall time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;

    /// Real time remaining until `target`, zero if it has passed
    fn duration_until(&self, target: NaiveDateTime) -> Duration {
        (target - self.now()).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Real system clock in the local time zone
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn duration_until(&self, target: NaiveDateTime) -> Duration {
        // Resolve through the zone so DST transitions between now and the
        // target are accounted for. Targets inside a gap fall back to the
        // naive difference.
        let resolved = Local.from_local_datetime(&target);
        match resolved.earliest().or_else(|| resolved.latest()) {
            Some(at) => (at - Local::now()).to_std().unwrap_or(Duration::ZERO),
            None => (target - self.now()).to_std().unwrap_or(Duration::ZERO),
        }
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl FakeClock {
    /// A clock fixed at midnight on 2026-01-01
    pub fn new() -> Self {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
        Self::at(date.and_time(NaiveTime::MIN))
    }

    pub fn at(instant: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(instant)),
        }
    }

    /// A clock on 2026-01-01 at the given local time
    pub fn at_hm(hour: u32, minute: u32) -> Self {
        let clock = Self::new();
        clock.set_hm(hour, minute);
        clock
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(delta) = chrono::Duration::from_std(duration) {
            *current += delta;
        }
    }

    /// Set the clock to a specific instant
    pub fn set(&self, instant: NaiveDateTime) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = instant;
    }

    /// Move to the given time of day, keeping the current date
    pub fn set_hm(&self, hour: u32, minute: u32) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) {
            *current = current.date().and_time(time);
        }
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
