// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Persisted instance identity (spec.md §6).
//!
//! A single small JSON file, written once after successful registration
//! and read at startup. Its absence is the signal to register again —
//! there is no migration or versioning concern at this size.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("could not read state file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("could not write state file {path}: {source}")]
    Write { path: String, #[source] source: std::io::Error },
    #[error("state file {path} is not valid JSON: {source}")]
    Decode { path: String, #[source] source: serde_json::Error },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub instance_id: String,
    pub heartbeat_interval: u64,
}

impl InstanceState {
    /// Returns `Ok(None)` when the file is simply absent — the normal
    /// first-run case that triggers registration, not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, StateError> {
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateError::Read { path: path.display().to_string(), source: e }),
        };
        let state = serde_json::from_str(&body)
            .map_err(|e| StateError::Decode { path: path.display().to_string(), source: e })?;
        Ok(Some(state))
    }

    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StateError::Write { path: path.display().to_string(), source: e })?;
        }
        let body = serde_json::to_string_pretty(self).unwrap_or_default();
        std::fs::write(path, body)
            .map_err(|e| StateError::Write { path: path.display().to_string(), source: e })
    }
}
