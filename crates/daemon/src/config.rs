// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Centralized environment variable access (spec.md §6).

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

/// Resolved, validated configuration for one agent run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host IP used in every port binding. `PORT_BIND_IP`, default `127.0.0.1`.
    pub port_bind_ip: String,
    /// Master base URL. `HALTI_SERVER`, default `http://localhost:4040`.
    pub master_url: String,
    /// Passed to the engine adapter's pull. `ALLOW_INSEC_REGISTRY`, default `false`.
    pub allow_insecure_registry: bool,
    /// Comma-separated tags advertised to master, opaque to the core. `CAPABILITIES`.
    pub capabilities: Vec<String>,
    /// Where `{instance_id, heartbeat_interval}` is persisted. `HALTI_STATE_FILE`.
    pub state_file: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self {
            port_bind_ip: env_or("PORT_BIND_IP", "127.0.0.1"),
            master_url: env_or("HALTI_SERVER", "http://localhost:4040"),
            allow_insecure_registry: env_bool("ALLOW_INSEC_REGISTRY"),
            capabilities: env_or("CAPABILITIES", "")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            state_file: state_file_path()?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// `true`/`True` and `false`/`False` are the only recognized spellings;
/// anything else (including unset) is `false`.
fn env_bool(key: &str) -> bool {
    matches!(std::env::var(key).as_deref(), Ok("true") | Ok("True"))
}

/// `HALTI_STATE_FILE` > `XDG_STATE_HOME/halti-agent/state.json` > `~/.local/state/halti-agent/state.json`.
fn state_file_path() -> Result<PathBuf, LifecycleError> {
    if let Ok(path) = std::env::var("HALTI_STATE_FILE") {
        return Ok(PathBuf::from(path));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("halti-agent").join("state.json"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/halti-agent/state.json"))
}

/// Translate `LOG_LEVEL` (`DEBUG|INFO|WARNING|ERROR`) into a `tracing_subscriber::EnvFilter`
/// directive string. Unset or unrecognized falls back to `info`.
pub fn log_level_directive() -> String {
    match std::env::var("LOG_LEVEL").unwrap_or_default().to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
    .to_string()
}
