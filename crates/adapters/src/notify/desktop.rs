// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notifications via `notify-send`

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use kusuri_core::Notification;
use tokio::process::Command;

/// Shows notifications through the freedesktop `notify-send` tool.
///
/// The tag is passed as the synchronous/stack hints understood by the common
/// notification daemons, so a new alert with the same tag replaces the old
/// one in place.
#[derive(Clone, Debug)]
pub struct DesktopNotifyAdapter {
    app_name: String,
    program: String,
}

impl DesktopNotifyAdapter {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            program: "notify-send".to_string(),
        }
    }

    fn build_args(&self, notification: &Notification) -> Vec<String> {
        let tag = notification.tag.as_str();
        let mut args = vec![
            format!("--app-name={}", self.app_name),
            format!("--hint=string:x-canonical-private-synchronous:{}", tag),
            format!("--hint=string:x-dunst-stack-tag:{}", tag),
        ];

        if !notification.icon.is_empty() {
            args.push(format!("--icon={}", notification.icon));
        }

        // Critical urgency stays on screen until dismissed
        if notification.require_interaction {
            args.push("--urgency=critical".to_string());
        } else {
            args.push("--urgency=normal".to_string());
        }

        args.push(notification.title.clone());
        args.push(notification.body.clone());
        args
    }
}

impl Default for DesktopNotifyAdapter {
    fn default() -> Self {
        Self::new("kusuri")
    }
}

#[async_trait]
impl NotifyAdapter for DesktopNotifyAdapter {
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        if !notification.vibrate.is_empty() {
            tracing::trace!(pattern = ?notification.vibrate, "vibration not supported on desktop");
        }

        let output = Command::new(&self.program)
            .args(self.build_args(notification))
            .output()
            .await
            .map_err(|e| NotifyError::Failed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Permission denied") || stderr.contains("not authorized") {
                return Err(NotifyError::PermissionDenied);
            }
            return Err(NotifyError::Failed(stderr.trim().to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "desktop_tests.rs"]
mod tests;
