// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opens the application through an external opener (`xdg-open`)
//!
//! A desktop has no way to enumerate browser tabs, so this adapter reports no
//! clients and every tap opens the application root.

use super::{WindowAdapter, WindowClient, WindowError};
use async_trait::async_trait;
use tokio::process::Command;

#[derive(Clone, Debug)]
pub struct CommandWindowAdapter {
    opener: String,
}

impl CommandWindowAdapter {
    pub fn new(opener: impl Into<String>) -> Self {
        Self {
            opener: opener.into(),
        }
    }
}

impl Default for CommandWindowAdapter {
    fn default() -> Self {
        Self::new("xdg-open")
    }
}

#[async_trait]
impl WindowAdapter for CommandWindowAdapter {
    async fn clients(&self) -> Result<Vec<WindowClient>, WindowError> {
        Ok(Vec::new())
    }

    async fn focus(&self, id: &str) -> Result<(), WindowError> {
        Err(WindowError::NotFound(id.to_string()))
    }

    async fn open(&self, url: &str) -> Result<(), WindowError> {
        let status = Command::new(&self.opener)
            .arg(url)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| WindowError::OpenFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(WindowError::OpenFailed {
                url: url.to_string(),
                message: format!("{} exited with {}", self.opener, status),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
