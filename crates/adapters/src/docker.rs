// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! `EngineAdapter` implementation that shells out to the `docker` CLI.
//!
//! Deliberately CLI-driven rather than a bound Docker Engine API client:
//! it needs nothing the `docker` binary doesn't already expose, and it
//! avoids vendoring a socket-level HTTP client for a single process that
//! already has one installed on every host it runs on.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use halti_core::engine::{BindingKey, EngineAdapter, EngineError, PortDeclaration, StartSpec};
use halti_core::model::RunningContainer;

use crate::OWNERSHIP_LABEL_PREDICATE;

/// `EngineAdapter` backed by `docker ps`/`pull`/`run`/`rm`.
pub struct DockerAdapter {
    allow_insecure_registry: bool,
}

impl DockerAdapter {
    pub fn new(allow_insecure_registry: bool) -> Self {
        Self { allow_insecure_registry }
    }
}

#[async_trait]
impl EngineAdapter for DockerAdapter {
    async fn list_owned(&self) -> Result<Vec<RunningContainer>, EngineError> {
        let output = run_docker(&[
            "ps",
            "--filter",
            OWNERSHIP_LABEL_PREDICATE,
            "--format",
            "{{json .}}",
        ])
        .await?;

        output
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| {
                let row: PsRow = serde_json::from_str(line).map_err(|e| {
                    EngineError::Unavailable(format!("could not parse `docker ps` output: {e}"))
                })?;
                Ok(row.into_running_container())
            })
            .collect()
    }

    async fn stop_and_remove(&self, id: &str) -> Result<(), EngineError> {
        run_docker(&["stop", id]).await?;
        run_docker(&["rm", id]).await.map(|_| ())
    }

    async fn pull(&self, image: &str) -> Result<(), EngineError> {
        if self.allow_insecure_registry {
            debug!(%image, "ALLOW_INSEC_REGISTRY is set; docker CLI pull has no per-call equivalent, relying on daemon-level registry config");
        }
        run_docker(&["pull", image]).await.map(|_| ())
    }

    async fn start(&self, spec: &StartSpec) -> Result<(), EngineError> {
        let mut args = vec!["run".to_string(), "-d".to_string(), "--name".to_string(), spec.name.clone()];
        args.extend(["--restart".to_string(), "always".to_string()]);

        for (key, value) in &spec.env {
            args.extend(["-e".to_string(), format!("{key}={value}")]);
        }

        for (key, value) in &spec.labels {
            args.extend(["--label".to_string(), format!("{key}={value}")]);
        }

        for decl in &spec.ports_declaration {
            let container_port = match decl {
                PortDeclaration::Port(p) => *p,
                PortDeclaration::PortUdp(p) => *p,
            };
            let key = match decl {
                PortDeclaration::Port(p) => BindingKey::Legacy(*p),
                PortDeclaration::PortUdp(p) => BindingKey::Keyed(format!("{p}/udp")),
            };
            let binding = spec.port_bindings.get(&key).or_else(|| {
                spec.port_bindings.get(&BindingKey::Keyed(format!("{container_port}/tcp")))
            });
            let Some(binding) = binding else { continue };
            let host_side = match binding.source {
                Some(source) => format!("{}:{}:{}", binding.bind_ip, source, container_port),
                None => format!("{}::{}", binding.bind_ip, container_port),
            };
            let proto_suffix = matches!(decl, PortDeclaration::PortUdp(_)).then_some("/udp").unwrap_or("");
            args.extend(["-p".to_string(), format!("{host_side}{proto_suffix}")]);
        }

        if let Some(extra_hosts) = &spec.extra_hosts {
            for (host, ip) in extra_hosts {
                args.extend(["--add-host".to_string(), format!("{host}:{ip}")]);
            }
        }

        args.push(spec.image.clone());

        if let Some(command) = &spec.command {
            args.extend(command.clone());
        }

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run_docker(&arg_refs).await.map(|_| ())
    }
}

/// One row of `docker ps --format '{{json .}}'` output.
#[derive(Debug, Deserialize)]
struct PsRow {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Names")]
    names: String,
    #[serde(rename = "Labels")]
    labels: String,
}

impl PsRow {
    fn into_running_container(self) -> RunningContainer {
        let name = self.names.trim_start_matches('/').to_string();
        let version_label = parse_labels(&self.labels).get("version").cloned();
        RunningContainer { id: self.id, name, version_label }
    }
}

/// `docker ps`'s `Labels` field is a single comma-separated `k=v` string.
fn parse_labels(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn run_docker(args: &[&str]) -> Result<String, EngineError> {
    let output = Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| EngineError::Unavailable(format!("failed to exec docker: {e}")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(args = ?args, stderr = %stderr, "docker command failed");
        Err(EngineError::Rejected(format!("docker {} failed: {stderr}", args.first().unwrap_or(&""))))
    }
}
