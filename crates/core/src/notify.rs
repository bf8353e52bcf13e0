// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Notifications the reconciler sends to the master so it can
//! correlate its desired state with what actually happened locally.

use async_trait::async_trait;

/// One event in the reconciler's notification stream (spec.md §6).
///
/// `STOP_CONTAINER` is fired *before* the engine call that performs
/// the stop — an at-least-once view of this event stream is correct
/// even if the stop subsequently fails; consumers must be idempotent
/// (spec.md §9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyEvent {
    PullStart { image: String },
    PullFailed { image: String, error: String },
    StartContainer { service_id: String },
    StartContainerFailed { service_id: String, error: String },
    StopContainer { name: String },
}

impl NotifyEvent {
    /// Wire event name, e.g. `"PULL_START"`.
    pub fn event(&self) -> &'static str {
        match self {
            NotifyEvent::PullStart { .. } => "PULL_START",
            NotifyEvent::PullFailed { .. } => "PULL_FAILED",
            NotifyEvent::StartContainer { .. } => "START_CONTAINER",
            NotifyEvent::StartContainerFailed { .. } => "START_CONTAINER_FAILED",
            NotifyEvent::StopContainer { .. } => "STOP_CONTAINER",
        }
    }

    /// `"ERROR"` for failure events, `"INFO"` otherwise (spec.md §6).
    pub fn event_type(&self) -> &'static str {
        match self {
            NotifyEvent::PullFailed { .. } | NotifyEvent::StartContainerFailed { .. } => "ERROR",
            _ => "INFO",
        }
    }

    /// The single datum the master correlates against (image ref, service id, or error string).
    pub fn event_meta(&self) -> String {
        match self {
            NotifyEvent::PullStart { image } => image.clone(),
            NotifyEvent::PullFailed { error, .. } => error.clone(),
            NotifyEvent::StartContainer { service_id } => service_id.clone(),
            NotifyEvent::StartContainerFailed { error, .. } => error.clone(),
            NotifyEvent::StopContainer { name } => name.clone(),
        }
    }
}

/// The reconciler's sole side-channel back to the master.
///
/// Notification failures are logged by the implementation but never
/// raised into reconciliation control flow (spec.md §6, §7.1).
#[async_trait]
pub trait MasterNotifier: Send + Sync {
    async fn notify(&self, event: NotifyEvent);
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
