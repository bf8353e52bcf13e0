// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod docker;
pub mod master;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// `docker ps --filter` predicate selecting containers halti-agent owns.
pub(crate) const OWNERSHIP_LABEL_PREDICATE: &str = "label=halti";

pub use docker::DockerAdapter;
pub use master::{Heartbeat, MasterClient, MasterError, PlatformDescriptor, RegisterReply};
pub use state::{InstanceState, StateError};
