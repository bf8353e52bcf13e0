// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! The reconciliation algorithm (spec.md §4.2, §4.2.1).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::diff::diff;
use crate::engine::{BindingKey, BindingValue, EngineAdapter, EngineError, PortDeclaration, StartSpec};
use crate::model::{env_pairs_to_dict, DesiredSnapshot, PortBinding, Protocol, ServiceSpec};
use crate::notify::{MasterNotifier, NotifyEvent};

/// Hard failure out of a reconciliation pass: the engine adapter was
/// unreachable at the transport level. Per-service create/start
/// rejections never reach this type — they're soft and reported via
/// notification instead (spec.md §7.3).
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("engine adapter unreachable: {0}")]
    Engine(String),
}

/// The label key stamped on every container halti-agent creates, and
/// the sole predicate distinguishing managed containers from others on
/// the same host.
pub const OWNERSHIP_LABEL: &str = "halti";
pub const SERVICE_LABEL: &str = "service";
pub const VERSION_LABEL: &str = "version";

/// Stateless across invocations: consumes one `DesiredSnapshot` and
/// drives `engine` to realize it, reporting progress through
/// `notifier`. Safe to re-invoke with the same or an updated snapshot
/// at any cadence (spec.md §4.2 contract).
pub struct Reconciler {
    engine: Arc<dyn EngineAdapter>,
    notifier: Arc<dyn MasterNotifier>,
    bind_ip: String,
}

impl Reconciler {
    pub fn new(engine: Arc<dyn EngineAdapter>, notifier: Arc<dyn MasterNotifier>, bind_ip: String) -> Self {
        Self { engine, notifier, bind_ip }
    }

    /// Run one reconciliation pass against `snapshot`.
    pub async fn reconcile(&self, snapshot: &DesiredSnapshot) -> Result<(), ReconcileError> {
        let current = self
            .engine
            .list_owned()
            .await
            .map_err(|e| ReconcileError::Engine(e.to_string()))?;

        // Index: container name -> RunningContainer, service_id -> ServiceSpec.
        // A duplicate key (violating the snapshot uniqueness invariant the
        // master is responsible for) simply lets the later entry win here.
        let current_by_name: HashMap<String, _> =
            current.into_iter().map(|c| (c.name.clone(), c)).collect();
        let desired_by_id: HashMap<String, &ServiceSpec> =
            snapshot.services.iter().map(|s| (s.service_id.clone(), s)).collect();

        let (mut to_remove, mut to_start, in_both) =
            diff(current_by_name.keys().cloned(), desired_by_id.keys().cloned());

        // Version drift: literal string inequality forces stop+start.
        for key in &in_both {
            let desired = desired_by_id[key];
            let running = &current_by_name[key];
            if running.version_label.as_deref() != Some(desired.version.as_str()) {
                to_remove.insert(key.clone());
                to_start.insert(key.clone());
            }
        }

        // Stop phase strictly precedes start phase.
        for name in &to_remove {
            let Some(container) = current_by_name.get(name) else { continue };
            info!(name = %name, id = %container.id, "stopping container");
            self.notifier.notify(NotifyEvent::StopContainer { name: name.clone() }).await;
            if let Err(e) = self.engine.stop_and_remove(&container.id).await {
                match e {
                    EngineError::Unavailable(msg) => return Err(ReconcileError::Engine(msg)),
                    EngineError::Rejected(msg) => {
                        warn!(name = %name, error = %msg, "stop_and_remove rejected");
                    }
                }
            }
        }

        for service_id in &to_start {
            let Some(spec) = desired_by_id.get(service_id) else { continue };
            self.start_service(spec).await?;
        }

        Ok(())
    }

    /// Start-container sub-protocol (spec.md §4.2.1).
    async fn start_service(&self, spec: &ServiceSpec) -> Result<(), ReconcileError> {
        self.notifier.notify(NotifyEvent::PullStart { image: spec.image.clone() }).await;
        if let Err(e) = self.engine.pull(&spec.image).await {
            let msg = e.to_string();
            warn!(image = %spec.image, error = %msg, "image pull failed");
            self.notifier
                .notify(NotifyEvent::PullFailed { image: spec.image.clone(), error: msg })
                .await;
            return match e {
                EngineError::Unavailable(msg) => Err(ReconcileError::Engine(msg)),
                EngineError::Rejected(_) => Ok(()),
            };
        }

        let start_spec = self.build_start_spec(spec);

        info!(service_id = %spec.service_id, image = %spec.image, "starting container");
        self.notifier.notify(NotifyEvent::StartContainer { service_id: spec.service_id.clone() }).await;

        if let Err(e) = self.engine.start(&start_spec).await {
            let msg = e.to_string();
            warn!(service_id = %spec.service_id, error = %msg, "container create/start failed");
            self.notifier
                .notify(NotifyEvent::StartContainerFailed {
                    service_id: spec.service_id.clone(),
                    error: msg.clone(),
                })
                .await;
            if let EngineError::Unavailable(_) = e {
                return Err(ReconcileError::Engine(msg));
            }
        }

        Ok(())
    }

    /// Translate a `ServiceSpec` into the engine-ready payload (spec.md §4.2.1 steps 3-6).
    fn build_start_spec(&self, spec: &ServiceSpec) -> StartSpec {
        let mut env = env_pairs_to_dict(&spec.environment);
        env.insert("HALTI_SERVICE_ID".to_string(), spec.service_id.clone());

        let mut ports_declaration = Vec::new();
        let mut port_bindings: BTreeMap<BindingKey, BindingValue> = BTreeMap::new();

        for port in &spec.ports {
            match port {
                PortBinding::Legacy(p) => {
                    ports_declaration.push(PortDeclaration::Port(p.0));
                    port_bindings.insert(
                        BindingKey::Legacy(p.0),
                        BindingValue { bind_ip: self.bind_ip.clone(), source: None },
                    );
                }
                PortBinding::Modern { port, protocol, source } => {
                    let (decl, key) = match protocol {
                        Protocol::Udp => {
                            (PortDeclaration::PortUdp(*port), format!("{port}/udp"))
                        }
                        Protocol::Tcp => (PortDeclaration::Port(*port), format!("{port}/tcp")),
                    };
                    ports_declaration.push(decl);
                    port_bindings.insert(
                        BindingKey::Keyed(key),
                        BindingValue { bind_ip: self.bind_ip.clone(), source: *source },
                    );
                }
            }
        }

        let mut labels = BTreeMap::new();
        labels.insert(OWNERSHIP_LABEL.to_string(), "true".to_string());
        labels.insert(SERVICE_LABEL.to_string(), spec.name.clone());
        labels.insert(VERSION_LABEL.to_string(), spec.version.clone());

        let extra_hosts = spec
            .extra_hosts
            .as_ref()
            .map(|hosts| hosts.iter().map(|h| (h.host.clone(), h.ip.clone())).collect());

        let command = spec.command.clone().filter(|c| !c.is_empty());

        StartSpec {
            name: spec.service_id.clone(),
            image: spec.image.clone(),
            env,
            ports_declaration,
            port_bindings,
            labels,
            extra_hosts,
            command,
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
