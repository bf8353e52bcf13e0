// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Fakes for exercising the reconciler without a real engine or master.

// Lock poisoning here would mean a prior test already panicked; unwrapping
// is the correct way to propagate that into the current test's failure.
#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;

use crate::engine::{EngineAdapter, EngineError, StartSpec};
use crate::model::RunningContainer;
use crate::notify::{MasterNotifier, NotifyEvent};

/// In-memory `EngineAdapter` that records every call it receives.
#[derive(Default)]
pub struct FakeEngine {
    pub containers: Mutex<Vec<RunningContainer>>,
    pub pull_fails_for: Mutex<Vec<String>>,
    pub start_fails_for: Mutex<Vec<String>>,
    pub unavailable: Mutex<bool>,
    pub stopped: Mutex<Vec<String>>,
    pub started: Mutex<Vec<StartSpec>>,
    pub pulled: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn with_containers(containers: Vec<RunningContainer>) -> Self {
        Self { containers: Mutex::new(containers), ..Default::default() }
    }

    pub fn fail_pull(&self, image: impl Into<String>) {
        self.pull_fails_for.lock().unwrap().push(image.into());
    }

    pub fn fail_start(&self, name: impl Into<String>) {
        self.start_fails_for.lock().unwrap().push(name.into());
    }
}

#[async_trait]
impl EngineAdapter for FakeEngine {
    async fn list_owned(&self) -> Result<Vec<RunningContainer>, EngineError> {
        if *self.unavailable.lock().unwrap() {
            return Err(EngineError::Unavailable("fake engine down".into()));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    async fn stop_and_remove(&self, id: &str) -> Result<(), EngineError> {
        self.stopped.lock().unwrap().push(id.to_string());
        self.containers.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<(), EngineError> {
        self.pulled.lock().unwrap().push(image.to_string());
        if self.pull_fails_for.lock().unwrap().contains(&image.to_string()) {
            return Err(EngineError::Rejected(format!("pull failed: {image}")));
        }
        Ok(())
    }

    async fn start(&self, spec: &StartSpec) -> Result<(), EngineError> {
        if self.start_fails_for.lock().unwrap().contains(&spec.name) {
            return Err(EngineError::Rejected(format!("start failed: {}", spec.name)));
        }
        self.started.lock().unwrap().push(spec.clone());
        self.containers.lock().unwrap().push(RunningContainer {
            id: format!("fake-{}", spec.name),
            name: spec.name.clone(),
            version_label: spec.labels.get(crate::reconcile::VERSION_LABEL).cloned(),
        });
        Ok(())
    }
}

/// Records every notification it receives, in order.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<NotifyEvent>>,
}

#[async_trait]
impl MasterNotifier for RecordingNotifier {
    async fn notify(&self, event: NotifyEvent) {
        self.events.lock().unwrap().push(event);
    }
}
