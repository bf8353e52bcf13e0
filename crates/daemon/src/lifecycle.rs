// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Registration and persisted-state startup sequence (spec.md §6).
//!
//! Load-or-register, then proceed: read the persisted `InstanceState`
//! file; if absent, register against the master and persist the reply.
//! There is no event history to replay here, only the one JSON file.

use thiserror::Error;
use tracing::info;

use halti_adapters::{InstanceState, MasterClient, MasterError, PlatformDescriptor, StateError};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine a state directory (HOME is unset)")]
    NoStateDir,
    #[error("persisted state error: {0}")]
    State(#[from] StateError),
    #[error("could not register with master: {0}")]
    Master(#[from] MasterError),
}

/// Bring the agent to a registered state: load the persisted
/// `{instance_id, heartbeat_interval}` pair, or register against
/// `master` and persist the reply if none exists yet.
pub async fn startup(config: &Config, master: &MasterClient) -> Result<InstanceState, LifecycleError> {
    if let Some(state) = InstanceState::load(&config.state_file)? {
        info!(instance_id = %state.instance_id, "loaded persisted instance state");
        master.set_instance_id(state.instance_id.clone());
        return Ok(state);
    }

    info!("no persisted state found, registering with master");
    let descriptor = PlatformDescriptor::probe(config.capabilities.clone());
    let reply = master.register(&descriptor).await?;
    let state = InstanceState {
        instance_id: reply.instance_id,
        heartbeat_interval: reply.heartbeat_interval,
    };
    state.save(&config.state_file)?;
    master.set_instance_id(state.instance_id.clone());
    info!(instance_id = %state.instance_id, heartbeat_interval = state.heartbeat_interval, "registered with master");
    Ok(state)
}
