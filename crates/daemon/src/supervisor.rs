// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

//! The two long-lived tasks (spec.md §4.4, §5): `supervisor_loop` drives
//! the heartbeat cadence and watches the reconciler worker's liveness;
//! `reconciler_loop` drains the desired-state slot and reconciles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use halti_adapters::Heartbeat;
use halti_core::engine::EngineAdapter;
use halti_core::notify::MasterNotifier;
use halti_core::reconcile::Reconciler;

use crate::channel::DesiredStateSlot;

/// `true` unless the reconciler task has exited, by any means: a hard
/// (engine-unavailable) failure, or a panic unwinding out of a
/// reconciliation pass. `AbortHandle::is_finished` alone would miss
/// a still-registered-but-dead task's cause; `reconciler_alive` alone
/// would miss a panic, since `reconciler_loop` only clears it on its
/// ordinary `Err` return path. Checking both is the liveness truth.
fn reconciler_is_alive(handle: &AbortHandle, alive: &AtomicBool) -> bool {
    !handle.is_finished() && alive.load(Ordering::Relaxed)
}

/// Handles for the two spawned tasks plus the liveness flag the
/// supervisor polls. Dropping these does not stop the tasks; use the
/// `CancellationToken` passed to `spawn` for that.
pub struct Supervisor {
    pub supervisor_task: JoinHandle<()>,
    pub reconciler_task: JoinHandle<()>,
    reconciler_alive: Arc<AtomicBool>,
}

impl Supervisor {
    /// `true` unless the reconciler worker has died, from a hard engine
    /// failure or a panic.
    pub fn reconciler_is_alive(&self) -> bool {
        reconciler_is_alive(&self.reconciler_task.abort_handle(), &self.reconciler_alive)
    }
}

/// Clears `alive` on drop, which fires whether `reconciler_loop` returns
/// normally, on its `Err` path, or unwinds out of a panic — the only way
/// to observe all three uniformly (spec.md §4.4 step 3, §8 scenario 6).
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Spawn the supervisor and reconciler tasks.
///
/// `heartbeat` and `notifier` are usually the same `MasterClient` behind
/// two different trait objects, but are accepted separately so the
/// heartbeat leg can be swapped for a fake in tests without touching the
/// reconciler's notification path.
pub fn spawn(
    engine: Arc<dyn EngineAdapter>,
    heartbeat: Arc<dyn Heartbeat>,
    notifier: Arc<dyn MasterNotifier>,
    bind_ip: String,
    heartbeat_interval: Duration,
    cancel: CancellationToken,
) -> Supervisor {
    let slot = Arc::new(DesiredStateSlot::new());
    let reconciler_alive = Arc::new(AtomicBool::new(true));

    let reconciler = Reconciler::new(engine.clone(), notifier, bind_ip);
    let reconciler_task = {
        let slot = slot.clone();
        let reconciler_alive = reconciler_alive.clone();
        tokio::spawn(reconciler_loop(reconciler, slot, reconciler_alive))
    };
    let reconciler_handle = reconciler_task.abort_handle();

    let supervisor_task = {
        let reconciler_alive = reconciler_alive.clone();
        tokio::spawn(supervisor_loop(
            engine,
            heartbeat,
            slot,
            heartbeat_interval,
            reconciler_handle,
            reconciler_alive,
            cancel,
        ))
    };

    Supervisor { supervisor_task, reconciler_task, reconciler_alive }
}

/// Liveness check, heartbeat, offer, sleep — repeated until cancelled or
/// the reconciler worker is found dead (spec.md §4.4). The liveness
/// check runs before the heartbeat round-trip so detection never has to
/// wait out a request timeout on top of the sleep interval.
async fn supervisor_loop(
    engine: Arc<dyn EngineAdapter>,
    heartbeat: Arc<dyn Heartbeat>,
    slot: Arc<DesiredStateSlot>,
    heartbeat_interval: Duration,
    reconciler_handle: AbortHandle,
    reconciler_alive: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    loop {
        if !reconciler_is_alive(&reconciler_handle, &reconciler_alive) {
            error!("reconciler worker died; exiting with non-zero status");
            std::process::exit(1);
        }

        let containers = match engine.list_owned().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "could not list owned containers for heartbeat");
                Vec::new()
            }
        };

        let heartbeat_result = tokio::select! {
            _ = cancel.cancelled() => return,
            result = heartbeat.heartbeat(&containers) => result,
        };

        match heartbeat_result {
            Ok(snapshot) => slot.offer(snapshot),
            Err(e) => warn!(error = %e, "heartbeat failed, skipping this pass"),
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(heartbeat_interval) => {}
        }
    }
}

/// Take, reconcile, repeat. A hard (engine-unavailable) failure, or a
/// panic out of a reconciliation pass, ends the loop and (via
/// `AliveGuard`) flips `reconciler_alive` to `false` — the supervisor is
/// the one that acts on it (spec.md §4.2 step 6, §7.3). The reconciler
/// is never cancelled mid-pass; it always finishes the one it's on.
async fn reconciler_loop(
    reconciler: Reconciler,
    slot: Arc<DesiredStateSlot>,
    reconciler_alive: Arc<AtomicBool>,
) {
    let _guard = AliveGuard(reconciler_alive);
    info!("reconciler worker started");
    loop {
        let snapshot = slot.take().await;
        if let Err(e) = reconciler.reconcile(&snapshot).await {
            error!(error = %e, "reconciliation pass failed");
            return;
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
