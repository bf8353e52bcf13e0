// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! A fake master for exercising the supervisor loop without a network.

// Lock poisoning here would mean a prior test already panicked; unwrapping
// is the correct way to propagate that into the current test's failure.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use halti_core::model::{DesiredSnapshot, RunningContainer};
use halti_core::notify::{MasterNotifier, NotifyEvent};

use crate::master::{Heartbeat, MasterError};

/// Replies with a fixed, queued sequence of heartbeat responses and
/// records every notification it receives.
#[derive(Default)]
pub struct FakeMaster {
    pub heartbeat_replies: Mutex<VecDeque<DesiredSnapshot>>,
    pub heartbeats_received: Mutex<Vec<Vec<RunningContainer>>>,
    pub notifications: Mutex<Vec<NotifyEvent>>,
}

impl FakeMaster {
    /// Replies are consumed in order; once exhausted, an empty snapshot is returned.
    pub fn with_replies(replies: Vec<DesiredSnapshot>) -> Self {
        Self { heartbeat_replies: Mutex::new(replies.into()), ..Default::default() }
    }
}

#[async_trait]
impl Heartbeat for FakeMaster {
    async fn heartbeat(&self, containers: &[RunningContainer]) -> Result<DesiredSnapshot, MasterError> {
        self.heartbeats_received.lock().unwrap().push(containers.to_vec());
        Ok(self.heartbeat_replies.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[async_trait]
impl MasterNotifier for FakeMaster {
    async fn notify(&self, event: NotifyEvent) {
        self.notifications.lock().unwrap().push(event);
    }
}
