// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Core reconciliation primitives for halti-agent.
//!
//! This crate has no I/O. It defines the desired/current state data
//! model, the generic set-diff primitive, the `EngineAdapter` and
//! `MasterNotifier` contracts the reconciler drives, and the
//! reconciler algorithm itself. Concrete adapters (Docker CLI, HTTP
//! transport to the master) live in `halti-adapters`.

pub mod diff;
pub mod engine;
pub mod model;
pub mod notify;
pub mod reconcile;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use diff::diff;
pub use engine::{EngineAdapter, EngineError, StartSpec};
pub use model::{
    DesiredSnapshot, EnvPair, ExtraHost, LegacyPort, PortBinding, Protocol, RunningContainer,
    ServiceSpec,
};
pub use notify::{MasterNotifier, NotifyEvent};
pub use reconcile::{ReconcileError, Reconciler};
