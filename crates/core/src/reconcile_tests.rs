// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Emblica, Inc.

use std::sync::Arc;

use super::*;
use crate::model::{EnvPair, RunningContainer};
use crate::test_support::{FakeEngine, RecordingNotifier};

const UUID1: &str = "90d59a42-ff2b-4747-8692-290fe933d421";
const UUID2: &str = "90d59a42-ff2b-4747-8692-290fe933d422";
const UUID3: &str = "90d59a42-ff2b-4747-8692-290fe933d423";

fn mock_service(id: &str, name: &str, version: &str) -> ServiceSpec {
    ServiceSpec {
        service_id: id.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        image: "tutum/hello-world".to_string(),
        ports: vec![],
        environment: vec![],
        command: None,
        extra_hosts: None,
    }
}

fn mock_container(name: &str, version: &str) -> RunningContainer {
    RunningContainer {
        id: format!("{name}-id"),
        name: name.to_string(),
        version_label: Some(version.to_string()),
    }
}

fn reconciler(engine: Arc<FakeEngine>, notifier: Arc<RecordingNotifier>) -> Reconciler {
    Reconciler::new(engine, notifier, "127.0.0.1".to_string())
}

/// spec.md §8 scenario 1: empty current, empty desired.
#[tokio::test]
async fn scenario_empty_to_empty_is_a_no_op() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    reconciler(engine.clone(), notifier.clone())
        .reconcile(&DesiredSnapshot::default())
        .await
        .unwrap();
    assert!(engine.started.lock().unwrap().is_empty());
    assert!(engine.stopped.lock().unwrap().is_empty());
    assert!(notifier.events.lock().unwrap().is_empty());
}

/// spec.md §8 scenario 2: empty current, one desired service.
#[tokio::test]
async fn scenario_start_only() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot { services: vec![mock_service(UUID1, "hello1", "v1")] };

    reconciler(engine.clone(), notifier.clone()).reconcile(&snapshot).await.unwrap();

    let started = engine.started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].name, UUID1);
    assert!(engine.stopped.lock().unwrap().is_empty());
}

/// spec.md §8 scenario 3: stale container, one desired (different) service.
#[tokio::test]
async fn scenario_replace_unrelated_service() {
    let engine = Arc::new(FakeEngine::with_containers(vec![mock_container("hello1", "v1")]));
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot { services: vec![mock_service(UUID2, "hello2", "v2")] };

    reconciler(engine.clone(), notifier.clone()).reconcile(&snapshot).await.unwrap();

    assert_eq!(*engine.stopped.lock().unwrap(), vec!["hello1-id".to_string()]);
    let started = engine.started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].name, UUID2);
}

/// spec.md §8 scenario 4: version drift forces stop+start even though the
/// name/service_id coincide for hello1.
#[tokio::test]
async fn scenario_version_drift_forces_replace() {
    let engine = Arc::new(FakeEngine::with_containers(vec![mock_container("hello1", "v2")]));
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot {
        services: vec![
            mock_service(UUID1, "hello1", "v1"),
            mock_service(UUID2, "hello2", "v2"),
            mock_service(UUID3, "hello3", "v3"),
        ],
    };

    reconciler(engine.clone(), notifier.clone()).reconcile(&snapshot).await.unwrap();

    assert_eq!(*engine.stopped.lock().unwrap(), vec!["hello1-id".to_string()]);
    let mut started: Vec<String> =
        engine.started.lock().unwrap().iter().map(|s| s.name.clone()).collect();
    started.sort();
    assert_eq!(started, vec![UUID1.to_string(), UUID2.to_string(), UUID3.to_string()]);
}

/// spec.md §8 scenario 5 / original test_containers.py: pull failure emits
/// PULL_START then PULL_FAILED, in order, and creates nothing.
#[tokio::test]
async fn pull_failure_notifies_in_order_and_creates_nothing() {
    let engine = Arc::new(FakeEngine::default());
    engine.fail_pull("tutum/hello-world");
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot { services: vec![mock_service(UUID1, "hello1", "v1")] };

    reconciler(engine.clone(), notifier.clone()).reconcile(&snapshot).await.unwrap();

    assert!(engine.started.lock().unwrap().is_empty());
    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], NotifyEvent::PullStart { image } if image == "tutum/hello-world"));
    assert!(matches!(&events[1], NotifyEvent::PullFailed { image, .. } if image == "tutum/hello-world"));
    assert_eq!(events[1].event_type(), "ERROR");
}

/// A per-service create/start rejection is soft: it's reported but does not
/// block the other services in the same pass (spec.md §4.2, §7.2).
#[tokio::test]
async fn start_failure_for_one_service_does_not_block_others() {
    let engine = Arc::new(FakeEngine::default());
    engine.fail_start(UUID2);
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot {
        services: vec![
            mock_service(UUID1, "hello1", "v1"),
            mock_service(UUID2, "hello2", "v2"),
        ],
    };

    reconciler(engine.clone(), notifier.clone()).reconcile(&snapshot).await.unwrap();

    let started: Vec<String> = engine.started.lock().unwrap().iter().map(|s| s.name.clone()).collect();
    assert_eq!(started, vec![UUID1.to_string()]);
    let events = notifier.events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(e, NotifyEvent::StartContainerFailed { service_id, .. } if service_id == UUID2)));
}

/// Transport-level adapter failure is hard: it propagates out of the pass.
#[tokio::test]
async fn engine_unavailable_is_a_hard_failure() {
    let engine = Arc::new(FakeEngine::default());
    *engine.unavailable.lock().unwrap() = true;
    let notifier = Arc::new(RecordingNotifier::default());

    let result = reconciler(engine, notifier).reconcile(&DesiredSnapshot::default()).await;
    assert!(matches!(result, Err(ReconcileError::Engine(_))));
}

/// Idempotence: applying the same snapshot twice with no external change
/// produces no actions on the second pass (spec.md §8).
#[tokio::test]
async fn reapplying_same_snapshot_is_a_no_op_second_time() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot { services: vec![mock_service(UUID1, "hello1", "v1")] };

    let r = reconciler(engine.clone(), notifier.clone());
    r.reconcile(&snapshot).await.unwrap();
    assert_eq!(engine.started.lock().unwrap().len(), 1);

    engine.started.lock().unwrap().clear();
    notifier.events.lock().unwrap().clear();

    r.reconcile(&snapshot).await.unwrap();
    assert!(engine.started.lock().unwrap().is_empty());
    assert!(engine.stopped.lock().unwrap().is_empty());
}

/// A container missing the ownership label never reaches `current` — the
/// fake engine's `list_owned` already models the adapter-side filter, so it
/// is simply never passed in, and is therefore never removed or started over.
#[tokio::test]
async fn unlabeled_containers_are_invisible_to_the_core() {
    let engine = Arc::new(FakeEngine::default()); // empty: adapter filtered out the unlabeled container
    let notifier = Arc::new(RecordingNotifier::default());
    reconciler(engine.clone(), notifier).reconcile(&DesiredSnapshot::default()).await.unwrap();
    assert!(engine.stopped.lock().unwrap().is_empty());
}

/// env injection: `HALTI_SERVICE_ID` is always present, later keys in the
/// source list win over earlier ones with the same key.
#[tokio::test]
async fn start_spec_injects_service_id_and_flattens_env_last_wins() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut service = mock_service(UUID1, "hello1", "v1");
    service.environment = vec![
        EnvPair { key: "FOO".into(), value: "1".into() },
        EnvPair { key: "FOO".into(), value: "2".into() },
    ];
    let snapshot = DesiredSnapshot { services: vec![service] };

    reconciler(engine.clone(), notifier).reconcile(&snapshot).await.unwrap();

    let started = engine.started.lock().unwrap();
    assert_eq!(started[0].env.get("FOO").map(String::as_str), Some("2"));
    assert_eq!(started[0].env.get("HALTI_SERVICE_ID").map(String::as_str), Some(UUID1));
}

/// Labels always carry ownership/service/version, matching §3's invariant.
#[tokio::test]
async fn start_spec_carries_ownership_service_and_version_labels() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let snapshot = DesiredSnapshot { services: vec![mock_service(UUID1, "hello1", "v7")] };

    reconciler(engine.clone(), notifier).reconcile(&snapshot).await.unwrap();

    let started = engine.started.lock().unwrap();
    assert_eq!(started[0].labels.get(OWNERSHIP_LABEL).map(String::as_str), Some("true"));
    assert_eq!(started[0].labels.get(SERVICE_LABEL).map(String::as_str), Some("hello1"));
    assert_eq!(started[0].labels.get(VERSION_LABEL).map(String::as_str), Some("v7"));
}

/// An empty `command` is treated the same as a missing one: no argv override.
#[tokio::test]
async fn empty_command_means_use_image_default() {
    let engine = Arc::new(FakeEngine::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut service = mock_service(UUID1, "hello1", "v1");
    service.command = Some(vec![]);
    let snapshot = DesiredSnapshot { services: vec![service] };

    reconciler(engine.clone(), notifier).reconcile(&snapshot).await.unwrap();

    assert!(engine.started.lock().unwrap()[0].command.is_none());
}
