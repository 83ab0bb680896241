// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the host runtime's user-facing surfaces

pub mod notify;
pub mod traced;
pub mod window;

pub use notify::{DesktopNotifyAdapter, NotifyAdapter, NotifyError};
pub use traced::{TracedNotifyAdapter, TracedWindowAdapter};
pub use window::{CommandWindowAdapter, WindowAdapter, WindowClient, WindowError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use window::{FakeWindowAdapter, WindowCall};
