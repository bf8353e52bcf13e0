// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! HTTP transport to the control plane (spec.md §6).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use halti_core::model::{DesiredSnapshot, RunningContainer};
use halti_core::notify::{MasterNotifier, NotifyEvent};

const REGISTER_PATH: &str = "/api/v1/instances/register";
const HEARTBEAT_PATH: &str = "/api/v1/instances/{}/heartbeat";
const NOTIFY_PATH: &str = "/api/v1/instances/{}/notify";

/// Request timeout. Always kept shorter than the heartbeat interval per
/// spec.md §5's cancellation rule; the supervisor treats a timed-out
/// heartbeat as a skipped pass, never a fatal error.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MasterError {
    #[error("could not reach master: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("master replied with a body the agent could not decode: {0}")]
    Decode(String),
}

/// Descriptor sent once at registration, advertising what this node can run.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformDescriptor {
    pub hostname: String,
    pub cpu_count: usize,
    pub os_name: String,
    pub os_version: String,
    pub engine: String,
    pub engine_version: String,
    pub capabilities: Vec<String>,
}

impl PlatformDescriptor {
    /// Probe the local host. `capabilities` comes from the `CAPABILITIES`
    /// env var (spec.md §6), already split and trimmed by the caller.
    pub fn probe(capabilities: Vec<String>) -> Self {
        let info = os_info::get();
        Self {
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string()),
            cpu_count: num_cpus::get(),
            os_name: info.os_type().to_string(),
            os_version: info.version().to_string(),
            engine: "docker".to_string(),
            engine_version: "unknown".to_string(),
            capabilities,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterReply {
    pub instance_id: String,
    pub heartbeat_interval: u64,
}

#[derive(Debug, Serialize)]
struct WireRunningContainer<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Names")]
    names: [String; 1],
}

#[derive(Debug, Serialize)]
struct NotifyBody<'a> {
    event: &'a str,
    event_type: &'a str,
    event_meta: &'a str,
}

/// The supervisor's view of the master — split out from `MasterClient` so
/// the supervisor loop can be driven by a fake in tests, the same way the
/// original Python statekeeper took its side-effecting collaborators as
/// constructor parameters.
#[async_trait]
pub trait Heartbeat: Send + Sync {
    async fn heartbeat(&self, containers: &[RunningContainer]) -> Result<DesiredSnapshot, MasterError>;
}

/// Thin `reqwest`-backed client for the three master endpoints.
///
/// Registration and heartbeat are synchronous request/reply calls the
/// supervisor awaits directly; `notify` additionally implements
/// `MasterNotifier` so the reconciler can report events without knowing
/// about HTTP at all.
pub struct MasterClient {
    http: reqwest::Client,
    base_url: String,
    instance_id: std::sync::OnceLock<String>,
}

impl MasterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default();
        Self { http, base_url: base_url.into(), instance_id: std::sync::OnceLock::new() }
    }

    /// Bind the instance id returned by `register` so later `heartbeat`/
    /// `notify` calls know which instance they speak for.
    pub fn set_instance_id(&self, instance_id: String) {
        let _ = self.instance_id.set(instance_id);
    }

    fn instance_id(&self) -> &str {
        self.instance_id.get().map(String::as_str).unwrap_or_default()
    }

    pub async fn register(
        &self,
        descriptor: &PlatformDescriptor,
    ) -> Result<RegisterReply, MasterError> {
        let url = format!("{}{}", self.base_url, REGISTER_PATH);
        let reply: RegisterReply =
            self.http.post(&url).json(descriptor).send().await?.error_for_status()?.json().await?;
        Ok(reply)
    }

}

#[async_trait]
impl Heartbeat for MasterClient {
    async fn heartbeat(&self, containers: &[RunningContainer]) -> Result<DesiredSnapshot, MasterError> {
        let url = format!(
            "{}{}",
            self.base_url,
            HEARTBEAT_PATH.replace("{}", self.instance_id())
        );
        let wire: Vec<WireRunningContainer> = containers
            .iter()
            .map(|c| WireRunningContainer { id: &c.id, names: [format!("/{}", c.name)] })
            .collect();
        debug!(count = wire.len(), "sending heartbeat");
        let snapshot = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "containers": wire }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(snapshot)
    }
}

#[async_trait]
impl MasterNotifier for MasterClient {
    /// Notification failures are logged, never raised (spec.md §4.2, §7.1):
    /// the reconciler must not stall or abort a pass because the master is
    /// momentarily unreachable.
    async fn notify(&self, event: NotifyEvent) {
        let url = format!("{}{}", self.base_url, NOTIFY_PATH.replace("{}", self.instance_id()));
        let body = NotifyBody {
            event: event.event(),
            event_type: event.event_type(),
            event_meta: &event.event_meta(),
        };
        if let Err(e) = self.http.post(&url).json(&body).send().await {
            warn!(event = event.event(), error = %e, "could not notify master");
        }
    }
}
