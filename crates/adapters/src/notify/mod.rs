// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification adapters

mod desktop;

pub use desktop::DesktopNotifyAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifyAdapter, NotifyCall};

use async_trait::async_trait;
use kusuri_core::Notification;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification permission denied")]
    PermissionDenied,
    #[error("notification failed: {0}")]
    Failed(String),
}

/// Adapter for the platform's notification surface
#[async_trait]
pub trait NotifyAdapter: Clone + Send + Sync + 'static {
    /// Show a notification, replacing any showing with the same tag
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError>;
}
