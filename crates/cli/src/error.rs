// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing error display with context and suggestions.

use std::fmt;
use std::path::Path;

use crate::client::ClientError;

/// Error with context and recovery suggestions
#[derive(Debug)]
pub struct KusuriError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl KusuriError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Explain a top-level failure. `log_path` is the daemon log, when known.
    pub fn explain(err: &anyhow::Error, log_path: Option<&Path>) -> Self {
        match err.downcast_ref::<ClientError>() {
            Some(client) => Self::from_client(client, log_path),
            None => Self::new(format!("{:#}", err)),
        }
    }

    fn from_client(err: &ClientError, log_path: Option<&Path>) -> Self {
        match err {
            ClientError::DaemonNotRunning => Self::new("kusurid is not running")
                .with_suggestion("Start it with: kusuri daemon start"),
            ClientError::DaemonStartFailed(reason) => {
                let mut error =
                    Self::new("kusurid failed to start").with_context(reason.clone());
                if let Some(log) = log_path {
                    error = error.with_suggestion(format!("Check the log: {}", log.display()));
                }
                error.with_suggestion("Run it in the foreground: kusuri daemon start --foreground")
            }
            ClientError::DaemonStartTimeout => Self::new("kusurid did not come up in time")
                .with_context("The socket never appeared")
                .with_suggestion("Raise KUSURI_TIMEOUT_CONNECT_MS")
                .with_suggestion("Check status with: kusuri daemon status"),
            ClientError::Rejected(reason) => {
                Self::new("the daemon rejected the request").with_context(reason.clone())
            }
            ClientError::Protocol(_) | ClientError::UnexpectedResponse => Self::new(err.to_string())
                .with_context("The daemon may be from a different kusuri version")
                .with_suggestion("Restart it with: kusuri daemon stop && kusuri daemon start"),
            ClientError::Io(_) | ClientError::Paths(_) => Self::new(err.to_string()),
        }
    }
}

impl fmt::Display for KusuriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for KusuriError {}
