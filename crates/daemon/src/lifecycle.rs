// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, wake scheduling, shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use kusuri_adapters::{
    CommandWindowAdapter, DesktopNotifyAdapter, NotifyAdapter, TracedNotifyAdapter,
    TracedWindowAdapter, WindowAdapter,
};
use kusuri_core::{ClientMessage, Clock, ConfigError, EngineConfig, SystemClock};
use kusuri_engine::{Engine, EngineDeps, EngineError, WakeReport};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::periodic::PeriodicWakes;

/// Longest the event loop sleeps, so wall-clock jumps and suspends are
/// noticed even when the next timer is hours away
pub const MAX_SLEEP: Duration = Duration::from_secs(60);

/// How long shutdown waits for in-flight notifications
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

const SUBSCRIBER_CAPACITY: usize = 16;

/// Daemon with the real host adapters (wrapped with tracing)
pub type SystemDaemon = DaemonState<
    TracedNotifyAdapter<DesktopNotifyAdapter>,
    TracedWindowAdapter<CommandWindowAdapter>,
    SystemClock,
>;

/// Daemon paths
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    /// Engine configuration file; may not exist
    pub config_path: PathBuf,
}

impl Config {
    /// Resolve paths from the environment
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::for_dirs(state_dir()?, socket_dir(), config_path()?))
    }

    pub fn for_dirs(state_dir: PathBuf, socket_dir: PathBuf, config_path: PathBuf) -> Self {
        Self {
            socket_path: socket_dir.join("kusurid.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            config_path,
            state_dir,
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig, LifecycleError> {
        Ok(EngineConfig::load(&self.config_path)?)
    }
}

/// Daemon state during operation
pub struct DaemonState<N: NotifyAdapter, W: WindowAdapter, C: Clock> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub engine: Engine<N, W, C>,
    pub periodic: PeriodicWakes,
    /// Dispatcher-originated messages for subscribed clients
    pub subscribers: broadcast::Sender<ClientMessage>,
    pub start_time: Instant,
    pub shutdown_requested: bool,
}

impl<N, W, C> DaemonState<N, W, C>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    /// Send a message to every subscribed client
    pub fn broadcast(&self, message: ClientMessage) -> usize {
        // No receivers is not an error; nobody is listening yet
        self.subscribers.send(message).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.receiver_count()
    }

    /// Fire any timers that are due
    pub fn fire_timers(&mut self) -> usize {
        self.engine.on_timer_deadline()
    }

    /// Fire one periodic wake
    pub fn periodic_wake(&mut self, tag: &str) -> WakeReport {
        self.engine.on_periodic_wake(tag)
    }

    /// Fire the periodic wakes whose interval has elapsed
    pub fn fire_periodic(&mut self, now: Instant) -> Vec<(String, WakeReport)> {
        self.periodic
            .take_due(now)
            .into_iter()
            .map(|tag| {
                let report = self.engine.on_periodic_wake(&tag);
                (tag, report)
            })
            .collect()
    }

    /// Register a periodic wake, warning if it leaves reconciliation gaps
    pub fn register_periodic(&mut self, tag: String, interval: Duration) -> Result<(), ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroWakeInterval);
        }
        if tag == self.engine.config().wake_tag {
            if let Err(e) = self.engine.config().check_wake_interval(interval) {
                warn!(%tag, error = %e, "periodic wake registered with coverage gap");
            }
        }
        if let Some(previous) = self.periodic.interval(&tag) {
            info!(%tag, ?previous, ?interval, "replacing periodic wake");
        }
        self.periodic.register(tag, interval, Instant::now());
        info!(registered = self.periodic.len(), "periodic wakes");
        Ok(())
    }

    /// How long the event loop may sleep before something needs attention
    pub fn next_wake_in(&self, now: Instant) -> Duration {
        let timer = self
            .engine
            .next_deadline()
            .map(|at| self.engine.clock().duration_until(at));
        let periodic = self
            .periodic
            .next_deadline()
            .map(|at| at.saturating_duration_since(now));

        [timer, periodic]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(MAX_SLEEP)
            .min(MAX_SLEEP)
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let lifetime = self.engine.lifetime();
        if lifetime.in_flight() > 0 {
            info!(in_flight = lifetime.in_flight(), "waiting for in-flight work");
            if tokio::time::timeout(DRAIN_TIMEOUT, lifetime.drained())
                .await
                .is_err()
            {
                warn!("in-flight work did not finish before shutdown");
            }
        }

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), "failed to remove file: {}", e);
                }
            }
        }

        // Lock is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Start the daemon with the real host adapters
pub async fn startup(config: &Config) -> Result<SystemDaemon, LifecycleError> {
    let engine_config = config.engine_config()?;
    let deps = EngineDeps {
        notify: TracedNotifyAdapter::new(DesktopNotifyAdapter::default()),
        windows: TracedWindowAdapter::new(CommandWindowAdapter::default()),
    };
    startup_with(config, engine_config, deps, SystemClock).await
}

/// Start the daemon with the given collaborators
pub async fn startup_with<N, W, C>(
    config: &Config,
    engine_config: EngineConfig,
    deps: EngineDeps<N, W>,
    clock: C,
) -> Result<DaemonState<N, W, C>, LifecycleError>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    match startup_inner(config, engine_config, deps, clock).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure; a lock failure
            // means they belong to the daemon that holds it
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner<N, W, C>(
    config: &Config,
    engine_config: EngineConfig,
    deps: EngineDeps<N, W>,
    clock: C,
) -> Result<DaemonState<N, W, C>, LifecycleError>
where
    N: NotifyAdapter,
    W: WindowAdapter,
    C: Clock,
{
    // 1. Create directories
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = acquire_lock(&config.lock_path)?;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Build the engine BEFORE binding (fail fast on bad config)
    let mut engine = Engine::new(deps, engine_config, clock)?;
    engine.on_install();

    // 4. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let (subscribers, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
    let mut daemon = DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        engine,
        periodic: PeriodicWakes::new(),
        subscribers,
        start_time: Instant::now(),
        shutdown_requested: false,
    };

    // 5. Activate: ask any client that is already listening to resync
    for message in daemon.engine.on_activate() {
        daemon.broadcast(message);
    }

    info!(socket = %config.socket_path.display(), "Daemon started");
    Ok(daemon)
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    use std::io::Write;

    // Open without truncating so a running daemon's PID survives a failed
    // second start
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
}

/// State directory for kusuri
///
/// `KUSURI_STATE_DIR`, else `$XDG_STATE_HOME/kusuri`, else
/// `~/.local/state/kusuri`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("KUSURI_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("kusuri"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/kusuri"))
}

/// Socket directory for kusuri
///
/// Uses /tmp/kusuri by default to keep paths short (macOS SUN_LEN = 104).
/// Can be overridden with KUSURI_SOCKET_DIR for testing.
pub fn socket_dir() -> PathBuf {
    match std::env::var("KUSURI_SOCKET_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => PathBuf::from("/tmp/kusuri"),
    }
}

/// Engine configuration file: `KUSURI_CONFIG`, else
/// `<config_dir>/kusuri/config.toml`
pub fn config_path() -> Result<PathBuf, LifecycleError> {
    if let Ok(path) = std::env::var("KUSURI_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let dir = dirs::config_dir().ok_or(LifecycleError::NoConfigDir)?;
    Ok(dir.join("kusuri").join("config.toml"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
