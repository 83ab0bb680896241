// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Window adapters: enumerate, focus, and open application windows

mod command;

pub use command::CommandWindowAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWindowAdapter, WindowCall};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window not found: {0}")]
    NotFound(String),
    #[error("failed to open {url}: {message}")]
    OpenFailed { url: String, message: String },
}

/// A client window known to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClient {
    pub id: String,
    pub url: String,
}

impl WindowClient {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}

/// Adapter for the host's client-window enumeration
#[async_trait]
pub trait WindowAdapter: Clone + Send + Sync + 'static {
    /// All windows, including ones not yet controlled by the daemon
    async fn clients(&self) -> Result<Vec<WindowClient>, WindowError>;

    async fn focus(&self, id: &str) -> Result<(), WindowError>;

    async fn open(&self, url: &str) -> Result<(), WindowError>;
}
