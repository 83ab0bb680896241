// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! kusuri - medication reminder CLI

mod client;
mod commands;
mod completions;
mod error;
mod input;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, reminders, validate, wake, watch};
use kusuri_daemon::Config;

use crate::client::DaemonClient;
use crate::error::KusuriError;

#[derive(Parser)]
#[command(name = "kusuri", version, about = "Kusuri - medication reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the daemon's schedule
    Schedule(reminders::ScheduleArgs),
    /// Deliver whatever is due right now
    CheckNow(reminders::CheckNowArgs),
    /// Check the daemon is alive
    Ping,
    /// Fire a periodic wake
    Wake(wake::WakeArgs),
    /// Register a recurring periodic wake
    RegisterWake(wake::RegisterWakeArgs),
    /// Report a notification tap
    Click(reminders::ClickArgs),
    /// Keep the daemon supplied with a schedule
    Watch(watch::WatchArgs),
    /// Check a schedule file without contacting the daemon
    Validate(validate::ValidateArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let log_path = Config::load().ok().map(|c| c.log_path);
            eprint!("{}", KusuriError::explain(&e, log_path.as_deref()));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        // Handled without the daemon
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(())
        }
        Commands::Validate(args) => validate::handle(&Config::load()?.engine_config()?, args),
        Commands::Daemon(args) => daemon::daemon(args, &Config::load()?).await,
        Commands::Watch(args) => {
            let config = Config::load()?;
            watch::handle(&config, &config.engine_config()?, args).await
        }

        // Everything else goes through the daemon, starting it if needed
        Commands::Schedule(args) => reminders::schedule(&connect().await?, args).await,
        Commands::CheckNow(args) => reminders::check_now(&connect().await?, args).await,
        Commands::Ping => reminders::ping(&connect().await?).await,
        Commands::Click(args) => reminders::click(&connect().await?, args).await,
        Commands::Wake(args) => {
            let engine = Config::load()?.engine_config()?;
            wake::wake(&connect().await?, &engine, args).await
        }
        Commands::RegisterWake(args) => {
            let engine = Config::load()?.engine_config()?;
            wake::register_wake(&connect().await?, &engine, args).await
        }
    }
}

async fn connect() -> Result<DaemonClient> {
    let config = Config::load()?;
    Ok(DaemonClient::connect_or_start(&config).await?)
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
