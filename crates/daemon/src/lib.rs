// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod channel;
pub mod config;
pub mod lifecycle;
pub mod supervisor;

pub use channel::DesiredStateSlot;
pub use config::{log_level_directive, Config};
pub use lifecycle::{startup, LifecycleError};
pub use supervisor::Supervisor;
