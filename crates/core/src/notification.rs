// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-visible notification payload

use crate::time_of_day::TimeOfDay;
use serde::{Deserialize, Serialize};
use std::fmt;

/// De-duplication key under which the notification surface coalesces alerts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationTag(pub String);

impl NotificationTag {
    pub fn for_time(time: TimeOfDay) -> Self {
        NotificationTag(time.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NotificationTag {
    fn from(s: &str) -> Self {
        NotificationTag(s.to_string())
    }
}

/// What to do when an alert with the same tag is still showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Renotify {
    /// Replace it and alert again
    Replace,
    /// Leave it; do not alert again for the same occurrence
    Suppress,
}

impl Renotify {
    pub fn from_flag(renotify: bool) -> Self {
        if renotify {
            Renotify::Replace
        } else {
            Renotify::Suppress
        }
    }
}

/// Deployment-fixed parts of every reminder notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationTemplate {
    pub title: String,
    pub icon: String,
    /// Vibration pattern in milliseconds, on/off alternating
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
}

impl Default for NotificationTemplate {
    fn default() -> Self {
        Self {
            title: "Medication reminder".to_string(),
            icon: "./icon-192.png".to_string(),
            vibrate: vec![300, 100, 300],
            require_interaction: false,
        }
    }
}

impl NotificationTemplate {
    pub fn render(&self, tag: NotificationTag, body: impl Into<String>) -> Notification {
        Notification {
            title: self.title.clone(),
            body: body.into(),
            icon: self.icon.clone(),
            vibrate: self.vibrate.clone(),
            tag,
            renotify: Renotify::Replace,
            require_interaction: self.require_interaction,
        }
    }
}

/// A notification to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub vibrate: Vec<u32>,
    pub tag: NotificationTag,
    pub renotify: Renotify,
    pub require_interaction: bool,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        tag: impl Into<NotificationTag>,
    ) -> Self {
        NotificationTemplate {
            title: title.into(),
            ..NotificationTemplate::default()
        }
        .render(tag.into(), body)
    }

    pub fn with_renotify(mut self, renotify: Renotify) -> Self {
        self.renotify = renotify;
        self
    }
}
