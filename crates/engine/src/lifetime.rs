// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keep-alive accounting for asynchronous side effects
//!
//! Handlers return as soon as they have decided what to do; the actual
//! notification or window work runs in a spawned task. The host may stop
//! the daemon once no work is in flight, so every spawned effect holds a
//! [`LifetimeGuard`] until it completes.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct Lifetime {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifetime {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            in_flight: Arc::new(tx),
        }
    }

    /// Hold the daemon alive until the returned guard is dropped
    pub fn extend(&self) -> LifetimeGuard {
        self.in_flight.send_modify(|n| *n += 1);
        LifetimeGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Run `fut` in the background, holding the lifetime until it finishes
    pub fn wait_until<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = self.extend();
        tokio::spawn(async move {
            let output = fut.await;
            drop(guard);
            output
        })
    }

    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Resolves once no work is in flight
    pub async fn drained(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

/// Decrements the in-flight count on drop
pub struct LifetimeGuard {
    in_flight: Arc<watch::Sender<usize>>,
}

impl Drop for LifetimeGuard {
    fn drop(&mut self) {
        self.in_flight.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "lifetime_tests.rs"]
mod tests;
