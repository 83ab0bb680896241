// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management: start, stop, status

use anyhow::{Context, Result};
use clap::Subcommand;
use kusuri_daemon::Config;

use crate::client::{daemon_stop, find_kusurid_binary, ClientError, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(clap::Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start {
        /// Run in the foreground instead, logging to the state directory
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Show daemon status
    Status {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

pub async fn daemon(args: DaemonArgs, config: &Config) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground: true } => {
            let binary = find_kusurid_binary();
            let status = std::process::Command::new(&binary)
                .status()
                .with_context(|| format!("failed to run {}", binary.display()))?;
            if !status.success() {
                anyhow::bail!("kusurid exited with {}", status);
            }
        }
        DaemonCommand::Start { foreground: false } => {
            if DaemonClient::connect(config).is_ok() {
                println!("Daemon already running");
                return Ok(());
            }
            DaemonClient::connect_or_start(config).await?;
            println!("Daemon started");
        }
        DaemonCommand::Stop => {
            if daemon_stop(config).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
        DaemonCommand::Status { format } => match DaemonClient::connect(config) {
            Ok(client) => {
                let status = client.status().await?;
                output::print(&status, format)?;
            }
            Err(ClientError::DaemonNotRunning) => println!("Daemon not running"),
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
