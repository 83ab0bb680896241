// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daily one-shot timers, one per reminder
//!
//! Each reminder owns a small state machine:
//!
//! ```text
//! Idle --Arm--> Armed --Fire--> Fired --Arm--> Armed(next) ...
//!   ^                                            |
//!   +------------------- Clear ------------------+
//! ```
//!
//! Every arm computes the next occurrence from the wall clock, never by
//! adding a fixed interval to the previous target, so clock changes do not
//! accumulate drift. Replacing the schedule discards every slot and bumps
//! the generation, so ids handed out earlier can never fire again.

use chrono::NaiveDateTime;
use kusuri_core::{NotificationTag, ReminderSpec, Schedule, TimeOfDay};
use std::fmt;

/// Identifies one armed slot within one schedule generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub generation: u64,
    pub slot: usize,
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}/{}", self.generation, self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed {
        fire_at: NaiveDateTime,
    },
    Fired {
        /// The instant the timer was armed for
        target: NaiveDateTime,
        /// When it was observed firing
        at: NaiveDateTime,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum TimerEvent {
    Arm { now: NaiveDateTime },
    Fire { now: NaiveDateTime },
    Clear,
}

impl TimerState {
    /// Apply an event. Events that are not valid in the current state leave
    /// it unchanged.
    pub fn transition(self, event: TimerEvent, time: TimeOfDay) -> TimerState {
        match (self, event) {
            (_, TimerEvent::Clear) => TimerState::Idle,

            (TimerState::Idle, TimerEvent::Arm { now }) => TimerState::Armed {
                fire_at: time.next_after(now),
            },

            // Host wake-ups can be early; never re-target the occurrence that
            // just fired
            (TimerState::Fired { target, .. }, TimerEvent::Arm { now }) => TimerState::Armed {
                fire_at: time.next_after(now.max(target)),
            },

            (TimerState::Armed { fire_at }, TimerEvent::Fire { now }) if now >= fire_at => {
                TimerState::Fired {
                    target: fire_at,
                    at: now,
                }
            }

            (state @ TimerState::Armed { .. }, TimerEvent::Arm { .. }) => {
                tracing::warn!(?state, "timer already armed, ignoring arm");
                state
            }

            (state, _) => state,
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(self, TimerState::Armed { .. })
    }
}

#[derive(Debug, Clone)]
struct TimerSlot {
    id: TimerId,
    spec: ReminderSpec,
    time: TimeOfDay,
    tag: NotificationTag,
    state: TimerState,
}

impl TimerSlot {
    fn apply(&mut self, event: TimerEvent) {
        self.state = self.state.transition(event, self.time);
    }
}

/// A pending wake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedTimer {
    pub id: TimerId,
    pub tag: NotificationTag,
    pub fire_at: NaiveDateTime,
}

/// A timer that has fired and awaits re-arming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub tag: NotificationTag,
    pub message: String,
    pub target: NaiveDateTime,
}

/// Owns every armed timer; the only place they are created or destroyed
#[derive(Debug, Default)]
pub struct TimerScheduler {
    generation: u64,
    slots: Vec<TimerSlot>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all timers, then arm one per valid reminder in `schedule`.
    ///
    /// Entries whose time does not parse are skipped. Returns the number of
    /// timers armed.
    pub fn arm(&mut self, schedule: &Schedule, now: NaiveDateTime) -> usize {
        self.clear();

        for spec in schedule {
            let Ok(time) = spec.time_of_day() else {
                tracing::debug!(time = %spec.time, "skipping reminder with unparseable time");
                continue;
            };

            let mut slot = TimerSlot {
                id: TimerId {
                    generation: self.generation,
                    slot: self.slots.len(),
                },
                spec: spec.clone(),
                time,
                tag: NotificationTag::for_time(time),
                state: TimerState::Idle,
            };
            slot.apply(TimerEvent::Arm { now });

            if let TimerState::Armed { fire_at } = slot.state {
                tracing::debug!(id = %slot.id, tag = %slot.tag, %fire_at, "armed");
            }
            self.slots.push(slot);
        }

        self.armed_count()
    }

    /// Drop every timer. Ids from before the clear become stale.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.apply(TimerEvent::Clear);
        }
        self.slots.clear();
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn armed_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state.is_armed()).count()
    }

    pub fn armed(&self) -> Vec<ArmedTimer> {
        self.slots
            .iter()
            .filter_map(|s| match s.state {
                TimerState::Armed { fire_at } => Some(ArmedTimer {
                    id: s.id,
                    tag: s.tag.clone(),
                    fire_at,
                }),
                _ => None,
            })
            .collect()
    }

    /// Earliest pending fire time
    pub fn next_deadline(&self) -> Option<NaiveDateTime> {
        self.slots
            .iter()
            .filter_map(|s| match s.state {
                TimerState::Armed { fire_at } => Some(fire_at),
                _ => None,
            })
            .min()
    }

    /// Fire every timer whose instant has been reached.
    ///
    /// Fired timers stay in the `Fired` state until [`rearm`](Self::rearm).
    pub fn fire_due(&mut self, now: NaiveDateTime) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        for slot in &mut self.slots {
            slot.apply(TimerEvent::Fire { now });
            if let TimerState::Fired { target, at } = slot.state {
                if at == now {
                    fired.push(FiredTimer {
                        id: slot.id,
                        tag: slot.tag.clone(),
                        message: slot.spec.message.clone(),
                        target,
                    });
                }
            }
        }
        fired
    }

    /// Arm a fired timer for its next occurrence.
    ///
    /// Returns the new fire time, or `None` if the id is stale or the timer
    /// is not in the `Fired` state.
    pub fn rearm(&mut self, id: TimerId, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let slot = self.slot_mut(id)?;
        if !matches!(slot.state, TimerState::Fired { .. }) {
            return None;
        }
        slot.apply(TimerEvent::Arm { now });
        match slot.state {
            TimerState::Armed { fire_at } => Some(fire_at),
            _ => None,
        }
    }

    fn slot_mut(&mut self, id: TimerId) -> Option<&mut TimerSlot> {
        if id.generation != self.generation {
            return None;
        }
        self.slots.get_mut(id.slot)
    }
}

#[cfg(test)]
#[path = "timers_tests.rs"]
mod tests;
