// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::notify::{NotifyAdapter, NotifyError};
use crate::window::{WindowAdapter, WindowClient, WindowError};
use async_trait::async_trait;
use kusuri_core::Notification;

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn show(&self, notification: &Notification) -> Result<(), NotifyError> {
        let span = tracing::info_span!("notify.show", tag = %notification.tag);
        let _guard = span.enter();

        tracing::debug!(
            body_len = notification.body.len(),
            renotify = ?notification.renotify,
            "showing"
        );

        let start = std::time::Instant::now();
        let result = self.inner.show(notification).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "notification shown"),
            // Not retried; the next timer or wake is the recovery path
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "notification failed"
            ),
        }

        result
    }
}

/// Wrapper that adds tracing to any WindowAdapter
#[derive(Clone)]
pub struct TracedWindowAdapter<W> {
    inner: W,
}

impl<W> TracedWindowAdapter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<W: WindowAdapter> WindowAdapter for TracedWindowAdapter<W> {
    async fn clients(&self) -> Result<Vec<WindowClient>, WindowError> {
        let result = self.inner.clients().await;
        tracing::trace!(count = result.as_ref().map(|c| c.len()).ok(), "listed clients");
        result
    }

    async fn focus(&self, id: &str) -> Result<(), WindowError> {
        let span = tracing::info_span!("window.focus", id);
        let _guard = span.enter();

        let result = self.inner.focus(id).await;
        match &result {
            Ok(()) => tracing::info!("focused"),
            Err(e) => tracing::warn!(error = %e, "focus failed"),
        }
        result
    }

    async fn open(&self, url: &str) -> Result<(), WindowError> {
        let span = tracing::info_span!("window.open", url);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.open(url).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "opened"),
            Err(e) => {
                tracing::error!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "open failed")
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
