// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-channel commands: schedule, check-now, ping, click

use std::path::PathBuf;

use anyhow::Result;
use kusuri_core::{Acknowledgements, NotificationTag};

use crate::client::DaemonClient;
use crate::input::{load_checks, load_schedule};

#[derive(clap::Args)]
pub struct ScheduleArgs {
    /// Schedule file (JSON array of reminders), `-` for stdin
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct CheckNowArgs {
    /// Schedule file (JSON array of reminders), `-` for stdin
    pub file: PathBuf,

    /// Acknowledgements file (JSON object of item id to taken)
    #[arg(long)]
    pub checks: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct ClickArgs {
    /// Tag of the tapped notification (its `HH:MM`)
    pub tag: String,
}

pub async fn schedule(client: &DaemonClient, args: ScheduleArgs) -> Result<()> {
    let times = load_schedule(&args.file)?;
    let count = client.schedule(times).await?;
    println!("Scheduled {} reminder{}", count, plural(count));
    Ok(())
}

pub async fn check_now(client: &DaemonClient, args: CheckNowArgs) -> Result<()> {
    let times = load_schedule(&args.file)?;
    let checks = match &args.checks {
        Some(path) => load_checks(path)?,
        None => Acknowledgements::new(),
    };
    client.check_now(times, checks).await?;
    println!("Checked");
    Ok(())
}

pub async fn ping(client: &DaemonClient) -> Result<()> {
    let (scheduled, timers) = client.ping().await?;
    println!("pong: {} scheduled, {} armed", scheduled, timers);
    Ok(())
}

pub async fn click(client: &DaemonClient, args: ClickArgs) -> Result<()> {
    client.click(NotificationTag::from(args.tag.as_str())).await?;
    Ok(())
}

pub(crate) fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
