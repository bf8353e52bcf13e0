// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Engine adapter contract: the boundary between the reconciler and
//! whatever container runtime actually runs things.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::RunningContainer;

/// Failures surfaced by the engine adapter.
///
/// `Rejected` is soft: scoped to one service, logged and notified, and
/// never aborts a reconciliation pass. `Unavailable` is hard: the
/// adapter itself can't be reached, which the reconciler propagates so
/// the pass — and the worker that ran it — can be treated as crashed
/// (spec.md §4.2, §7).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine rejected the request: {0}")]
    Rejected(String),
    #[error("engine adapter unreachable: {0}")]
    Unavailable(String),
}

/// A `/`-prefix-stripped container name plus its declared port, protocol and
/// host-binding translation, ready for the engine to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortDeclaration {
    /// Bare port number (legacy shape, or modern TCP).
    Port(u16),
    /// `(port, "udp")`.
    PortUdp(u16),
}

/// Host-side binding key, e.g. `"8080/tcp"` or a bare legacy port number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindingKey {
    Legacy(u16),
    Keyed(String),
}

/// `(bind_ip,)` when the engine should pick the host port, `(bind_ip, source)`
/// when the spec pinned one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingValue {
    pub bind_ip: String,
    pub source: Option<u16>,
}

/// Fully-translated, engine-ready payload built by the reconciler from
/// one `ServiceSpec` (spec.md §4.2.1 steps 3-6). This is the interface
/// stub boundary between the core algorithm and a concrete engine.
#[derive(Debug, Clone)]
pub struct StartSpec {
    /// Container name == `ServiceSpec::service_id`.
    pub name: String,
    pub image: String,
    pub env: BTreeMap<String, String>,
    pub ports_declaration: Vec<PortDeclaration>,
    pub port_bindings: BTreeMap<BindingKey, BindingValue>,
    pub labels: BTreeMap<String, String>,
    pub extra_hosts: Option<BTreeMap<String, String>>,
    /// Present and non-empty iff the `ServiceSpec` carried an argv override.
    pub command: Option<Vec<String>>,
}

/// The container-engine operations the reconciler drives.
///
/// Implementations must be safe for concurrent calls: both the
/// supervisor (`list_owned`) and the reconciler worker (everything
/// else) call through the same adapter instance.
#[async_trait]
pub trait EngineAdapter: Send + Sync {
    /// Containers carrying the ownership label. Unlabeled containers
    /// on the same host are invisible to the core — the adapter is
    /// the filter.
    async fn list_owned(&self) -> Result<Vec<RunningContainer>, EngineError>;

    async fn stop_and_remove(&self, id: &str) -> Result<(), EngineError>;

    async fn pull(&self, image: &str) -> Result<(), EngineError>;

    async fn start(&self, spec: &StartSpec) -> Result<(), EngineError>;
}
