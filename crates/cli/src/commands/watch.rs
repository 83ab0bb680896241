// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground client loop
//!
//! Holds a schedule and keeps the daemon supplied with it: pushes it on
//! connect, registers the periodic wake, and pushes it again whenever the
//! daemon asks. A lost connection (daemon restart) is retried until
//! interrupted.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use kusuri_core::{ClientMessage, EngineConfig, Schedule};
use kusuri_daemon::Config;
use tracing::{debug, info, warn};

use crate::client::{ClientError, DaemonClient};
use crate::input::load_schedule;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Schedule file (JSON array of reminders)
    pub file: PathBuf,

    /// Periodic wake interval (defaults to the configured `wake_interval`)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub every: Option<Duration>,

    /// Wake tag (defaults to the configured `wake_tag`)
    #[arg(long)]
    pub tag: Option<String>,
}

pub async fn handle(config: &Config, engine: &EngineConfig, args: WatchArgs) -> Result<()> {
    let schedule = load_schedule(&args.file)?;
    let tag = args.tag.unwrap_or_else(|| engine.wake_tag.clone());
    let every = args.every.unwrap_or(engine.wake_interval);

    tokio::select! {
        result = watch(config, &schedule, &tag, every) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nStopped watching");
            Ok(())
        }
    }
}

async fn watch(config: &Config, schedule: &Schedule, tag: &str, every: Duration) -> Result<()> {
    loop {
        match serve(config, schedule, tag, every).await {
            Ok(never) => match never {},
            // Start failures will not fix themselves
            Err(e @ ClientError::DaemonStartFailed(_)) => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "daemon connection lost");
                eprintln!("Lost connection to daemon ({}), reconnecting...", e);
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// One connected session; only returns on error
async fn serve(
    config: &Config,
    schedule: &Schedule,
    tag: &str,
    every: Duration,
) -> Result<std::convert::Infallible, ClientError> {
    let client = DaemonClient::connect_or_start(config).await?;

    // Push before subscribing so the daemon has no reason to ask
    push(&client, schedule).await?;
    client.register_wake(tag, every).await?;
    let mut subscription = client.subscribe().await?;
    info!(%tag, ?every, "watching");

    loop {
        match subscription.next().await? {
            ClientMessage::RequestReschedule => push(&client, schedule).await?,
            other => debug!(?other, "ignoring pushed message"),
        }
    }
}

async fn push(client: &DaemonClient, schedule: &Schedule) -> Result<(), ClientError> {
    let count = client.schedule(schedule.clone()).await?;
    println!(
        "Pushed {} reminder{}",
        count,
        super::reminders::plural(count)
    );
    Ok(())
}
