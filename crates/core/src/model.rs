// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Desired/current state data model.
//!
//! `ServiceSpec` is what the master sends; `RunningContainer` is what
//! the engine adapter reports back. The two are joined on
//! `service_id` == container name (see `reconcile::Reconciler`).

use serde::{Deserialize, Serialize};

/// One desired container instance, as received from the master.
///
/// Immutable once received; a reconciliation pass never mutates a
/// `ServiceSpec`, only diffs it against what is currently running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Opaque, unique-per-node identifier. Also the container's engine-level name.
    pub service_id: String,
    /// Human-readable service name (stamped as a label, used in logs).
    pub name: String,
    /// Opaque change-detection token. Inequality with the running
    /// container's `version` label is the sole replacement trigger.
    pub version: String,
    /// Registry reference.
    pub image: String,
    #[serde(default)]
    pub ports: Vec<PortBinding>,
    #[serde(default)]
    pub environment: Vec<EnvPair>,
    /// Argv override. Omitted or empty means "use the image's default command".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_hosts: Option<Vec<ExtraHost>>,
}

/// A single `{key, value}` environment entry as carried on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPair {
    pub key: String,
    pub value: String,
}

/// Flatten an ordered list of environment pairs into a map, later keys winning.
pub fn env_pairs_to_dict(pairs: &[EnvPair]) -> std::collections::BTreeMap<String, String> {
    pairs.iter().map(|p| (p.key.clone(), p.value.clone())).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraHost {
    pub host: String,
    pub ip: String,
}

/// `tcp` or `udp`, lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Legacy port shape: a bare integer or an all-digit string.
///
/// Always interpreted as TCP, bound on the agent's configured bind IP
/// with an engine-chosen host port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyPort(pub u16);

/// Two accepted wire shapes for a port binding (spec.md §3).
///
/// Modeled as a tagged variant rather than a runtime type check on the
/// deserialized value, per the REDESIGN FLAG in spec.md §9.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortBinding {
    Legacy(LegacyPort),
    Modern { port: u16, protocol: Protocol, source: Option<u16> },
}

impl Serialize for PortBinding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Modern {
            port: u16,
            protocol: Protocol,
            #[serde(skip_serializing_if = "Option::is_none")]
            source: Option<u16>,
        }
        match self {
            PortBinding::Legacy(LegacyPort(p)) => serializer.serialize_u16(*p),
            PortBinding::Modern { port, protocol, source } => {
                Modern { port: *port, protocol: *protocol, source: *source }.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for PortBinding {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u16),
            Str(String),
            Modern { port: u16, protocol: Protocol, #[serde(default)] source: Option<u16> },
        }
        match Wire::deserialize(deserializer)? {
            Wire::Int(p) => Ok(PortBinding::Legacy(LegacyPort(p))),
            Wire::Str(s) => {
                let p = s
                    .parse::<u16>()
                    .map_err(|_| serde::de::Error::custom(format!("not an all-digit port: {s}")))?;
                Ok(PortBinding::Legacy(LegacyPort(p)))
            }
            Wire::Modern { port, protocol, source } => {
                Ok(PortBinding::Modern { port, protocol, source })
            }
        }
    }
}

/// The view of a container as reported by the engine adapter.
///
/// Only containers carrying the ownership label ever become a
/// `RunningContainer` — the adapter is the filter, not the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningContainer {
    pub id: String,
    /// Engine-level name, already stripped of a leading `/` if present.
    pub name: String,
    /// The `version` label stamped at creation time, if present.
    pub version_label: Option<String>,
}

/// The set of `ServiceSpec`s returned by one heartbeat reply.
///
/// Fields beyond `services` that the master may send are ignored here;
/// deserialization doesn't `deny_unknown_fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredSnapshot {
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
