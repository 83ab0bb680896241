// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! window = "15m"
//! wake_tag = "kusuri-check"
//! wake_interval = "30m"
//! reconcile_renotify = false
//! app_url = "http://localhost:8080/"
//!
//! [notification]
//! title = "Medication reminder"
//! vibrate = [300, 100, 300]
//! ```

use crate::notification::{NotificationTemplate, Renotify};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the reconciliation window; beyond half a day "nearest
/// occurrence" stops meaning anything.
pub const MAX_WINDOW: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("reconciliation window must be at least one minute")]
    WindowTooSmall,
    #[error("reconciliation window {0:?} must be shorter than 12h")]
    WindowTooLarge(Duration),
    #[error("periodic wake interval must be non-zero")]
    ZeroWakeInterval,
    #[error("periodic wake interval {interval:?} exceeds twice the window {window:?}; reminders could be missed")]
    CoverageGap { interval: Duration, window: Duration },
    #[error("periodic wake tag must not be empty")]
    EmptyWakeTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// A reminder is due while `|now - time| <= window`
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Tag of the periodic wake the engine reacts to
    pub wake_tag: String,
    /// Expected interval of that wake; checked against `window`
    #[serde(with = "humantime_serde")]
    pub wake_interval: Duration,
    /// Re-alert on reconciliation even if already delivered for the occurrence
    pub reconcile_renotify: bool,
    /// Application root, opened or focused on notification tap
    pub app_url: String,
    pub notification: NotificationTemplate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            wake_tag: "kusuri-check".to_string(),
            wake_interval: Duration::from_secs(30 * 60),
            reconcile_renotify: false,
            app_url: "http://localhost:8080/".to_string(),
            notification: NotificationTemplate::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::Read(path.to_path_buf(), e)),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < Duration::from_secs(60) {
            return Err(ConfigError::WindowTooSmall);
        }
        if self.window >= MAX_WINDOW {
            return Err(ConfigError::WindowTooLarge(self.window));
        }
        if self.wake_tag.is_empty() {
            return Err(ConfigError::EmptyWakeTag);
        }
        self.check_wake_interval(self.wake_interval)
    }

    /// Whether a periodic wake at `interval` leaves no reconciliation gaps
    pub fn check_wake_interval(&self, interval: Duration) -> Result<(), ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroWakeInterval);
        }
        if interval > self.window * 2 {
            return Err(ConfigError::CoverageGap {
                interval,
                window: self.window,
            });
        }
        Ok(())
    }

    /// Window length in whole minutes
    pub fn window_minutes(&self) -> i64 {
        (self.window.as_secs() / 60) as i64
    }

    pub fn reconcile_policy(&self) -> Renotify {
        Renotify::from_flag(self.reconcile_renotify)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
