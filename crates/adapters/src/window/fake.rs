// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake window adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{WindowAdapter, WindowClient, WindowError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded window operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCall {
    Focus { id: String },
    Open { url: String },
}

#[derive(Default)]
struct FakeWindowState {
    clients: Vec<WindowClient>,
    calls: Vec<WindowCall>,
}

/// Fake window adapter with a configurable client list
#[derive(Clone, Default)]
pub struct FakeWindowAdapter {
    inner: Arc<Mutex<FakeWindowState>>,
}

impl FakeWindowAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&self, client: WindowClient) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.clients.push(client);
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.clone()
    }
}

#[async_trait]
impl WindowAdapter for FakeWindowAdapter {
    async fn clients(&self) -> Result<Vec<WindowClient>, WindowError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.clients.clone())
    }

    async fn focus(&self, id: &str) -> Result<(), WindowError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.clients.iter().any(|c| c.id == id) {
            return Err(WindowError::NotFound(id.to_string()));
        }
        inner.calls.push(WindowCall::Focus { id: id.to_string() });
        Ok(())
    }

    async fn open(&self, url: &str) -> Result<(), WindowError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(WindowCall::Open {
            url: url.to_string(),
        });
        Ok(())
    }
}
