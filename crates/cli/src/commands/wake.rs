// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic wake commands
//!
//! `kusuri wake` is meant for an external scheduler (cron, a systemd timer)
//! standing in for the host's coarse periodic wake.

use std::time::Duration;

use anyhow::Result;
use kusuri_core::EngineConfig;

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct WakeArgs {
    /// Wake tag (defaults to the configured `wake_tag`)
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(clap::Args)]
pub struct RegisterWakeArgs {
    /// Interval between wakes, e.g. `15m`
    #[arg(long, value_parser = humantime::parse_duration)]
    pub every: Duration,

    /// Wake tag (defaults to the configured `wake_tag`)
    #[arg(long)]
    pub tag: Option<String>,
}

pub async fn wake(client: &DaemonClient, engine: &EngineConfig, args: WakeArgs) -> Result<()> {
    let tag = args.tag.unwrap_or_else(|| engine.wake_tag.clone());
    let summary = client.wake(&tag).await?;

    print!("{} due, {} delivered", summary.due, summary.delivered);
    match summary.rearmed {
        Some(armed) => println!(", re-armed {} timer{}", armed, super::reminders::plural(armed)),
        None => println!(),
    }
    Ok(())
}

pub async fn register_wake(
    client: &DaemonClient,
    engine: &EngineConfig,
    args: RegisterWakeArgs,
) -> Result<()> {
    let tag = args.tag.unwrap_or_else(|| engine.wake_tag.clone());
    if let Err(e) = engine.check_wake_interval(args.every) {
        eprintln!("warning: {}", e);
    }
    client.register_wake(&tag, args.every).await?;
    println!(
        "Registered wake '{}' every {}",
        tag,
        humantime::format_duration(args.every)
    );
    Ok(())
}
