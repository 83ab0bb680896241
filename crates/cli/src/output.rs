// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt::Display;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table or summary
    #[default]
    Text,
    /// Pretty-printed JSON for scripts
    Json,
}

/// Print a report in the requested format
pub fn print<T: Serialize + Display>(value: &T, format: OutputFormat) -> serde_json::Result<()> {
    let rendered = match format {
        OutputFormat::Text => value.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
