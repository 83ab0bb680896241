// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule and acknowledgement files
//!
//! Both use the control-channel JSON shapes, so a file can be copied
//! straight out of a client's traffic:
//!
//! ```json
//! [{ "time": "08:00", "msg": "Morning meds", "medIds": [1, 2] }]
//! ```
//!
//! ```json
//! { "1": true, "2": false }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use kusuri_core::{Acknowledgements, Schedule};

/// Read a schedule; `-` reads stdin
pub fn load_schedule(path: &Path) -> Result<Schedule> {
    let content = read(path)?;
    parse_schedule(&content).with_context(|| format!("invalid schedule in {}", path.display()))
}

pub fn load_checks(path: &Path) -> Result<Acknowledgements> {
    let content = read(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid checks in {}", path.display()))
}

fn parse_schedule(content: &str) -> Result<Schedule> {
    // The wire format tolerates anything; a file that is not a list is a mistake
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_array() {
        anyhow::bail!("expected a JSON array of reminders");
    }
    Ok(serde_json::from_value(value)?)
}

fn read(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
