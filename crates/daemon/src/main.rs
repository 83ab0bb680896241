// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kusuri Daemon (kusurid)
//!
//! Background process that keeps reminder timers armed and answers the
//! control socket.

use std::io::Write;

use tokio::signal::unix::{signal, SignalKind};
use tokio::time::Instant;
use tracing::{error, info, warn};

use kusuri_daemon::lifecycle::{self, Config, LifecycleError, SystemDaemon};
use kusuri_daemon::{server, STARTUP_MARKER_PREFIX};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // Marker goes in before tracing so the CLI can find this run's section
    append_to_log(&config, &format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id()))?;
    let log_guard = setup_logging(&config)?;

    info!(config = %config.config_path.display(), "Starting kusurid");

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Tracing is non-blocking and may not flush before exit
            let _ = append_to_log(&config, &format!("ERROR Failed to start daemon: {}", e));
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!(socket = %config.socket_path.display(), "Daemon ready");
    // Parent processes (CLI, systemd) wait for this line
    println!("READY");

    let reason = run(&mut daemon).await?;
    info!("{}, shutting down", reason);
    daemon.shutdown().await?;

    info!("Daemon stopped");
    Ok(())
}

/// Serve until a signal or a `SHUTDOWN` request; returns why it stopped
async fn run(daemon: &mut SystemDaemon) -> Result<&'static str, LifecycleError> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    while !daemon.shutdown_requested {
        let sleep = daemon.next_wake_in(Instant::now());

        tokio::select! {
            accepted = daemon.listener.accept() => match accepted {
                Ok((stream, _)) => {
                    if let Err(e) = server::handle_connection(daemon, stream).await {
                        warn!(error = %e, "connection failed");
                    }
                }
                Err(e) => error!(error = %e, "accept failed"),
            },

            // Next timer, next periodic wake, or the sleep cap
            _ = tokio::time::sleep(sleep) => {
                let fired = daemon.fire_timers();
                if fired > 0 {
                    info!(fired, "timers fired");
                }
                for (tag, report) in daemon.fire_periodic(Instant::now()) {
                    info!(%tag, due = report.due, delivered = report.delivered, "periodic wake fired");
                }
            }

            _ = sigterm.recv() => return Ok("Received SIGTERM"),
            _ = sigint.recv() => return Ok("Received SIGINT"),
        }
    }

    Ok("Shutdown requested via IPC")
}

fn append_to_log(config: &Config, line: &str) -> Result<(), LifecycleError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::EnvFilter;

    let dir = config.log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let name = config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
