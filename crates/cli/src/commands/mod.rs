// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod daemon;
pub mod reminders;
pub mod validate;
pub mod wake;
pub mod watch;
