// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local time-of-day for reminders (`HH:MM`, 24h)

use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("empty time")]
    Empty,
    #[error("malformed time {0:?}: expected HH:MM")]
    Malformed(String),
    #[error("time {0:?} out of range")]
    OutOfRange(String),
}

/// A wall-clock time of day with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeParseError> {
        if hour > 23 || minute > 59 {
            return Err(TimeParseError::OutOfRange(format!("{}:{}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.hour * 60 + self.minute)
    }

    fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// The first instant matching this time of day strictly after `now`.
    ///
    /// Today if the time has not yet been reached, otherwise tomorrow.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.as_naive_time());
        if today > now {
            today
        } else {
            today
                .checked_add_days(Days::new(1))
                .unwrap_or(NaiveDateTime::MAX)
        }
    }

    /// Signed distance in whole minutes from today's occurrence to `now`,
    /// together with that occurrence.
    ///
    /// Positive means the occurrence is in the past. There is no wrap around
    /// midnight: a 00:03 reminder is 1435 minutes away at 23:58.
    pub fn offset_today(&self, now: NaiveDateTime) -> (i64, NaiveDateTime) {
        let now_minutes = i64::from(now.hour() * 60 + now.minute());
        let today = now.date().and_time(self.as_naive_time());
        (now_minutes - self.minutes_since_midnight(), today)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TimeParseError::Empty);
        }

        let Some((h, m)) = trimmed.split_once(':') else {
            return Err(TimeParseError::Malformed(s.to_string()));
        };
        let (h, m) = (h.trim(), m.trim());
        if h.is_empty() || m.is_empty() || m.contains(':') {
            return Err(TimeParseError::Malformed(s.to_string()));
        }

        let field = |part: &str| -> Result<u32, TimeParseError> {
            if part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TimeParseError::Malformed(s.to_string()));
            }
            part.parse()
                .map_err(|_| TimeParseError::Malformed(s.to_string()))
        };
        let hour = field(h)?;
        let minute = field(m)?;

        Self::new(hour, minute).map_err(|_| TimeParseError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
#[path = "time_of_day_tests.rs"]
mod tests;
