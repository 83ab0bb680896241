// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Window reconciliation
//!
//! Precise timers are lost whenever the host suspends the daemon. The
//! reconciler is the fallback: on any wake it looks at the wall clock and
//! reports every reminder whose occurrence today lies within the window,
//! in either direction. Distances do not wrap around midnight.

use chrono::{NaiveDate, NaiveDateTime};
use kusuri_core::{Acknowledgements, NotificationTag, ReminderSpec, Schedule};
use std::time::Duration;

/// A reminder found due by a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder<'a> {
    pub spec: &'a ReminderSpec,
    pub tag: NotificationTag,
    /// Date of the occurrence this pass refers to; the delivery key
    pub occurrence: NaiveDate,
    /// Minutes since the occurrence, negative if it is still ahead
    pub offset_minutes: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowReconciler {
    window_minutes: i64,
}

impl WindowReconciler {
    /// Sub-minute parts of `window` are ignored
    pub fn new(window: Duration) -> Self {
        Self {
            window_minutes: (window.as_secs() / 60) as i64,
        }
    }

    pub fn window_minutes(&self) -> i64 {
        self.window_minutes
    }

    /// Reminders in `schedule` that are due at `now`.
    ///
    /// Unparseable times are skipped. When `acks` is given, reminders whose
    /// items are all acknowledged are left out.
    pub fn due<'a>(
        &self,
        schedule: &'a Schedule,
        now: NaiveDateTime,
        acks: Option<&Acknowledgements>,
    ) -> Vec<DueReminder<'a>> {
        schedule
            .iter()
            .filter_map(|spec| {
                let time = spec.time_of_day().ok()?;
                let (offset, occurrence) = time.offset_today(now);
                if offset.abs() > self.window_minutes {
                    return None;
                }
                if acks.is_some_and(|acks| acks.covers(spec)) {
                    tracing::debug!(time = %time, "reminder already acknowledged");
                    return None;
                }
                Some(DueReminder {
                    spec,
                    tag: NotificationTag::for_time(time),
                    occurrence: occurrence.date(),
                    offset_minutes: offset,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
