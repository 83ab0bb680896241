// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use kusuri_core::{Notification, NotificationTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded notification
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub notification: Notification,
}

impl NotifyCall {
    pub fn tag(&self) -> &NotificationTag {
        &self.notification.tag
    }

    pub fn body(&self) -> &str {
        &self.notification.body
    }
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    denied: Arc<AtomicBool>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Bodies of recorded notifications, in order
    pub fn bodies(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.body().to_string()).collect()
    }

    /// Simulate the user revoking notification permission
    pub fn deny(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(NotifyError::PermissionDenied);
        }
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall {
                notification: notification.clone(),
            });
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
