// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Offline schedule check
//!
//! Arms a private scheduler exactly as the daemon would and reports which
//! entries arm, when each next fires, and which fall inside the
//! reconciliation window right now. Nothing is sent to the daemon.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use kusuri_core::{EngineConfig, Schedule, TimeOfDay};
use kusuri_engine::{TimerScheduler, WindowReconciler};
use serde::Serialize;

use crate::input::load_schedule;
use crate::output::{self, OutputFormat};

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Schedule file (JSON array of reminders), `-` for stdin
    pub file: PathBuf,

    /// Evaluate as if it were this time today
    #[arg(long, value_name = "HH:MM")]
    pub at: Option<TimeOfDay>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub fn handle(engine: &EngineConfig, args: ValidateArgs) -> Result<()> {
    let schedule = load_schedule(&args.file)?;

    let mut now = chrono::Local::now().naive_local();
    if let Some(at) = args.at {
        now = now
            .date()
            .and_hms_opt(at.hour(), at.minute(), 0)
            .context("invalid --at time")?;
    }
    let now = now.with_nanosecond(0).unwrap_or(now);

    let report = ValidationReport::build(&schedule, now, engine);
    output::print(&report, args.format)?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub now: NaiveDateTime,
    pub window_minutes: i64,
    pub armed: usize,
    pub entries: Vec<EntryReport>,
}

#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub time: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_fire: Option<NaiveDateTime>,
    pub due_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationReport {
    pub fn build(schedule: &Schedule, now: NaiveDateTime, engine: &EngineConfig) -> Self {
        let mut timers = TimerScheduler::new();
        let armed = timers.arm(schedule, now);
        // Slots follow schedule order, skipping unparseable entries
        let mut fire_times = timers.armed().into_iter().map(|t| t.fire_at);

        let reconciler = WindowReconciler::new(engine.window);
        let due = reconciler.due(schedule, now, None);

        let entries = schedule
            .iter()
            .map(|spec| {
                let due_now = due.iter().any(|d| std::ptr::eq(d.spec, spec));
                match spec.time_of_day() {
                    Ok(_) => EntryReport {
                        time: spec.time.clone(),
                        message: spec.message.clone(),
                        next_fire: fire_times.next(),
                        due_now,
                        error: None,
                    },
                    Err(e) => EntryReport {
                        time: spec.time.clone(),
                        message: spec.message.clone(),
                        next_fire: None,
                        due_now,
                        error: Some(e.to_string()),
                    },
                }
            })
            .collect();

        Self {
            now,
            window_minutes: reconciler.window_minutes(),
            armed,
            entries,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<8} {:<16} {:<4} MESSAGE", "TIME", "NEXT FIRE", "DUE")?;
        for entry in &self.entries {
            let next = entry
                .next_fire
                .map(|at| relative_day(self.now, at))
                .unwrap_or_else(|| "-".to_string());
            let due = match (&entry.error, entry.due_now) {
                (Some(_), _) => "-",
                (None, true) => "yes",
                (None, false) => "no",
            };
            let detail = match &entry.error {
                Some(error) => format!("skipped: {}", error),
                None => entry.message.clone(),
            };
            writeln!(f, "{:<8} {:<16} {:<4} {}", entry.time, next, due, detail)?;
        }
        write!(
            f,
            "{} entr{}, {} armed (window {}m)",
            self.entries.len(),
            if self.entries.len() == 1 { "y" } else { "ies" },
            self.armed,
            self.window_minutes
        )
    }
}

fn relative_day(now: NaiveDateTime, at: NaiveDateTime) -> String {
    let day = if at.date() == now.date() {
        "today"
    } else {
        "tomorrow"
    };
    format!("{} {}", day, at.format("%H:%M"))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
