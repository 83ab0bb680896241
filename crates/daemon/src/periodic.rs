// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic wake registrations
//!
//! Clients register a tag and an interval; the daemon fires the tag on that
//! cadence for as long as it runs. Registrations are not persisted, a client
//! re-registers after a restart along with its schedule.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Registration {
    interval: Duration,
    next: Instant,
}

#[derive(Debug, Default)]
pub struct PeriodicWakes {
    registrations: HashMap<String, Registration>,
}

impl PeriodicWakes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a periodic wake. The first fire is one interval
    /// from `now`.
    pub fn register(&mut self, tag: impl Into<String>, interval: Duration, now: Instant) {
        let tag = tag.into();
        tracing::info!(%tag, ?interval, "periodic wake registered");
        self.registrations.insert(
            tag,
            Registration {
                interval,
                next: now + interval,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn interval(&self, tag: &str) -> Option<Duration> {
        self.registrations.get(tag).map(|r| r.interval)
    }

    /// Earliest pending wake
    pub fn next_deadline(&self) -> Option<Instant> {
        self.registrations.values().map(|r| r.next).min()
    }

    /// Tags whose wake is due, each advanced to its next fire.
    ///
    /// A wake that fell behind (e.g. across a suspend) fires once and
    /// restarts its cadence from `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .registrations
            .iter_mut()
            .filter(|(_, r)| r.next <= now)
            .map(|(tag, r)| {
                r.next = now + r.interval;
                tag.clone()
            })
            .collect();
        due.sort();
        due
    }
}

#[cfg(test)]
#[path = "periodic_tests.rs"]
mod tests;
