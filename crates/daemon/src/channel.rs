// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! Single-slot, latest-wins handoff from the heartbeat loop to the
//! reconciler worker (spec.md §4.3).

use parking_lot::Mutex;
use tokio::sync::Notify;

use halti_core::model::DesiredSnapshot;

/// The heartbeat loop is the sole producer; the reconciler worker is
/// the sole consumer. `offer` never blocks and never loses the newest
/// snapshot — an overwrite simply discards the previous, unconsumed one.
#[derive(Default)]
pub struct DesiredStateSlot {
    slot: Mutex<Option<DesiredSnapshot>>,
    notify: Notify,
}

impl DesiredStateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the slot, displacing whatever was there before.
    pub fn offer(&self, snapshot: DesiredSnapshot) {
        *self.slot.lock() = Some(snapshot);
        self.notify.notify_one();
    }

    /// Block until a snapshot is available, then take it.
    pub async fn take(&self) -> DesiredSnapshot {
        loop {
            if let Some(snapshot) = self.slot.lock().take() {
                return snapshot;
            }
            self.notify.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn snapshot(marker: &str) -> DesiredSnapshot {
        DesiredSnapshot {
            services: vec![halti_core::model::ServiceSpec {
                service_id: marker.to_string(),
                name: marker.to_string(),
                version: "v1".to_string(),
                image: "img".to_string(),
                ports: vec![],
                environment: vec![],
                command: None,
                extra_hosts: None,
            }],
        }
    }

    #[tokio::test]
    async fn offer_then_take_round_trips() {
        let slot = DesiredStateSlot::new();
        slot.offer(snapshot("a"));
        let got = slot.take().await;
        assert_eq!(got.services[0].service_id, "a");
    }

    #[tokio::test]
    async fn second_offer_displaces_the_first_unconsumed_one() {
        let slot = DesiredStateSlot::new();
        slot.offer(snapshot("a"));
        slot.offer(snapshot("b"));
        let got = slot.take().await;
        assert_eq!(got.services[0].service_id, "b");
    }

    #[tokio::test]
    async fn take_blocks_until_an_offer_arrives() {
        let slot = Arc::new(DesiredStateSlot::new());
        let reader = {
            let slot = slot.clone();
            tokio::spawn(async move { slot.take().await })
        };
        // Give the reader a chance to park on `notified()` before offering.
        tokio::time::sleep(Duration::from_millis(20)).await;
        slot.offer(snapshot("late"));
        let got = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.services[0].service_id, "late");
    }
}
