//! Monitor ticks driven by a manual clock and an in-process source.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use vigil_config::MonitorConfig;
use vigil_core::clock::{Clock, ManualClock};
use vigil_core::enums::{TaskPriority, TaskType};
use vigil_monitor::{Monitor, MonitorError, MonitorStateStore, PeriodicTrigger, ReplayGuard};
use vigil_queue::{MemoryStore, RetryConfig, TaskQueue};
use vigil_vcs::{ChangeDetector, MemorySource};

struct Harness {
    queue: Arc<TaskQueue>,
    store: Arc<MemoryStore>,
    source: Arc<MemorySource>,
    clock: Arc<ManualClock>,
    monitor: Monitor,
}

fn harness(source: MemorySource, config: &MonitorConfig) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(
        TaskQueue::open(store.clone(), clock.clone())
            .unwrap()
            .with_retry(RetryConfig::no_retry()),
    );
    let source = Arc::new(source);
    let detector = ChangeDetector::new(source.clone(), clock.clone());
    let monitor = Monitor::new(queue.clone(), detector, clock.clone(), config);
    Harness {
        queue,
        store,
        source,
        clock,
        monitor,
    }
}

fn count_periodic(queue: &TaskQueue, trigger: PeriodicTrigger) -> usize {
    queue
        .list()
        .iter()
        .filter(|t| {
            t.metadata()
                .and_then(|m| m.get("trigger"))
                .is_some_and(|v| v == trigger.as_str())
        })
        .count()
}

#[test]
fn periodic_triggers_fire_even_when_source_always_fails() {
    let source = MemorySource::at("m1");
    source.set_failing(true);
    let mut h = harness(source, &MonitorConfig::default());

    let first = h.monitor.tick().unwrap();
    assert_eq!(
        first.triggers_fired,
        vec![PeriodicTrigger::SecurityScan, PeriodicTrigger::QualityCheck]
    );

    // Same instant: nothing is due.
    assert!(h.monitor.tick().unwrap().triggers_fired.is_empty());

    // Every five minutes for 24 hours.
    for _ in 0..(24 * 12) {
        h.clock.advance(TimeDelta::minutes(5));
        h.monitor.tick().unwrap();
    }

    assert_eq!(count_periodic(&h.queue, PeriodicTrigger::SecurityScan), 5);
    assert_eq!(count_periodic(&h.queue, PeriodicTrigger::QualityCheck), 3);
}

#[test]
fn periodic_tasks_have_expected_type_and_priority() {
    let mut h = harness(MemorySource::new(), &MonitorConfig::default());
    h.monitor.tick().unwrap();

    let pending = h.queue.get_pending();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].task_type(), TaskType::SecurityScan);
    assert_eq!(pending[0].priority(), TaskPriority::Normal);
    assert_eq!(pending[1].task_type(), TaskType::CodeReview);
    assert_eq!(pending[1].priority(), TaskPriority::Low);
    assert_eq!(pending[0].metadata().unwrap()["type"], "periodic");
}

#[test]
fn new_revision_creates_review_and_security_tasks() {
    let mut h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    let cold = h.monitor.tick().unwrap();
    assert!(!cold.changes_detected);

    h.source
        .commit("m2", ["src/lib.rs", "src/api/routes.rs", "README.md", "Cargo.toml"]);
    let report = h.monitor.tick().unwrap();
    assert!(report.changes_detected);
    assert_eq!(report.changed_paths, 4);
    assert_eq!(report.tasks_created.len(), 2);

    let review = h.queue.get(report.tasks_created[0]).unwrap();
    assert_eq!(review.task_type(), TaskType::CodeReview);
    assert_eq!(review.metadata().unwrap()["commit"], "m2");

    let scan = h.queue.get(report.tasks_created[1]).unwrap();
    assert_eq!(scan.task_type(), TaskType::SecurityScan);
    assert_eq!(scan.priority(), TaskPriority::High);
    assert_eq!(
        scan.metadata().unwrap()["files"],
        serde_json::json!(["src/api/routes.rs"])
    );

    // Seen revisions are not reported twice.
    assert!(!h.monitor.tick().unwrap().changes_detected);
}

#[test]
fn failed_enqueue_keeps_trigger_due() {
    let mut h = harness(MemorySource::new(), &MonitorConfig::default());
    h.store.fail_saves(2);

    let failed = h.monitor.tick().unwrap();
    assert_eq!(failed.store_failures, 2);
    assert!(failed.triggers_fired.is_empty());
    assert!(h.queue.list().is_empty());

    let retried = h.monitor.tick().unwrap();
    assert_eq!(retried.triggers_fired.len(), 2);
    assert_eq!(h.queue.list().len(), 2);
}

#[test]
fn failed_change_task_is_retried_next_tick() {
    let mut h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    h.monitor.tick().unwrap();

    h.source.commit("m2", ["src/secret.rs"]);
    h.store.fail_saves(1);
    let failed = h.monitor.tick().unwrap();
    assert_eq!(failed.store_failures, 1);
    assert!(failed.tasks_created.is_empty());

    let retried = h.monitor.tick().unwrap();
    assert!(retried.changes_detected);
    assert_eq!(retried.tasks_created.len(), 1);
    let scan = h.queue.get(retried.tasks_created[0]).unwrap();
    assert_eq!(scan.task_type(), TaskType::SecurityScan);
}

fn count_for_commit(queue: &TaskQueue, task_type: TaskType, commit: &str) -> usize {
    queue
        .list()
        .iter()
        .filter(|t| t.task_type() == task_type)
        .filter(|t| {
            t.metadata()
                .and_then(|m| m.get("commit"))
                .is_some_and(|v| v == commit)
        })
        .count()
}

#[test]
fn partial_failure_replays_only_the_lost_task() {
    let mut h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    h.monitor.tick().unwrap();

    h.source.commit("m2", ["a.rs", "b.rs", "c.rs", "auth.rs"]);
    // The review save fails, the security save goes through.
    h.store.fail_saves(1);
    let partial = h.monitor.tick().unwrap();
    assert_eq!(partial.store_failures, 1);
    assert_eq!(partial.tasks_created.len(), 1);
    assert_eq!(
        h.monitor.state().replay,
        Some(ReplayGuard {
            marker: "m2".to_string(),
            stored_titles: vec!["Security review for sensitive files".to_string()],
        })
    );

    let replayed = h.monitor.tick().unwrap();
    assert!(replayed.changes_detected);
    assert_eq!(replayed.store_failures, 0);
    assert_eq!(replayed.tasks_created.len(), 1);
    assert_eq!(h.monitor.state().replay, None);

    assert_eq!(count_for_commit(&h.queue, TaskType::SecurityScan, "m2"), 1);
    assert_eq!(count_for_commit(&h.queue, TaskType::CodeReview, "m2"), 1);
    assert!(!h.monitor.tick().unwrap().changes_detected);
}

#[test]
fn replay_record_survives_a_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let state_path = dir.path().join("monitor-state.json");

    let h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    let mut monitor = h
        .monitor
        .with_state_store(MonitorStateStore::new(&state_path))
        .unwrap();
    monitor.tick().unwrap();

    h.source.commit("m2", ["a.rs", "b.rs", "c.rs", "auth.rs"]);
    h.store.fail_saves(1);
    assert_eq!(monitor.tick().unwrap().store_failures, 1);
    drop(monitor);

    let detector = ChangeDetector::new(h.source.clone(), h.clock.clone());
    let mut restarted = Monitor::new(
        h.queue.clone(),
        detector,
        h.clock.clone(),
        &MonitorConfig::default(),
    )
    .with_state_store(MonitorStateStore::new(&state_path))
    .unwrap();
    assert_eq!(
        restarted.state().replay.map(|r| r.marker).as_deref(),
        Some("m2")
    );

    let report = restarted.tick().unwrap();
    assert_eq!(report.tasks_created.len(), 1);
    assert_eq!(count_for_commit(&h.queue, TaskType::SecurityScan, "m2"), 1);
    assert_eq!(count_for_commit(&h.queue, TaskType::CodeReview, "m2"), 1);
}

#[test]
fn replay_record_is_ignored_for_a_newer_revision() {
    let mut h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    h.monitor.tick().unwrap();

    h.source.commit("m2", ["a.rs", "b.rs", "c.rs", "auth.rs"]);
    h.store.fail_saves(1);
    h.monitor.tick().unwrap();

    // The source moves on before the retry; m3 is classified from scratch.
    h.source
        .commit("m3", ["a.rs", "b.rs", "c.rs", "auth.rs", "token.rs"]);
    let report = h.monitor.tick().unwrap();
    assert_eq!(report.tasks_created.len(), 2);
    assert_eq!(count_for_commit(&h.queue, TaskType::SecurityScan, "m3"), 1);
    assert_eq!(count_for_commit(&h.queue, TaskType::CodeReview, "m3"), 1);
    assert_eq!(h.monitor.state().replay, None);
}

#[test]
fn consecutive_store_failures_stop_the_monitor() {
    let config = MonitorConfig {
        max_consecutive_store_failures: 3,
        ..MonitorConfig::default()
    };
    let mut h = harness(MemorySource::new(), &config);
    h.store.fail_saves(usize::MAX);

    assert_eq!(h.monitor.tick().unwrap().store_failures, 2);
    assert_eq!(h.monitor.tick().unwrap().store_failures, 2);
    let err = h.monitor.tick().unwrap_err();
    assert!(matches!(
        err,
        MonitorError::Durability {
            consecutive_failures: 3,
            ..
        }
    ));
}

#[test]
fn a_good_tick_resets_the_failure_budget() {
    let config = MonitorConfig {
        max_consecutive_store_failures: 2,
        ..MonitorConfig::default()
    };
    let mut h = harness(MemorySource::new(), &config);

    h.store.fail_saves(2);
    assert_eq!(h.monitor.tick().unwrap().store_failures, 2);
    h.monitor.tick().unwrap();

    h.clock.advance(TimeDelta::hours(6));
    h.store.fail_saves(1);
    assert_eq!(h.monitor.tick().unwrap().store_failures, 1);
}

#[test]
fn state_store_resumes_watermark_and_stamps() {
    let dir = tempfile::TempDir::new().unwrap();
    let state_path = dir.path().join("monitor-state.json");

    let h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    let mut monitor = h
        .monitor
        .with_state_store(MonitorStateStore::new(&state_path))
        .unwrap();
    monitor.tick().unwrap();
    let saved = monitor.state();
    assert_eq!(saved.revision.last_seen_revision.as_deref(), Some("m1"));
    assert_eq!(saved.clock.last_security_scan, Some(h.clock.now()));

    // Restart an hour later while the source moved on.
    h.clock.advance(TimeDelta::hours(1));
    h.source.commit("m2", ["login.rs"]);
    let detector = ChangeDetector::new(h.source.clone(), h.clock.clone());
    let mut restarted = Monitor::new(
        h.queue.clone(),
        detector,
        h.clock.clone(),
        &MonitorConfig::default(),
    )
    .with_state_store(MonitorStateStore::new(&state_path))
    .unwrap();
    assert_eq!(restarted.state(), saved);

    let report = restarted.tick().unwrap();
    assert!(report.changes_detected);
    assert!(report.triggers_fired.is_empty());
}

#[tokio::test]
async fn cancelled_token_stops_before_first_tick() {
    let mut h = harness(MemorySource::new(), &MonitorConfig::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    h.monitor.run(cancel).await.unwrap();
    assert!(h.queue.list().is_empty());
}

#[tokio::test]
async fn cancellation_interrupts_the_sleep() {
    let h = harness(MemorySource::new(), &MonitorConfig::default());
    let queue = h.queue.clone();
    let mut monitor = h.monitor;
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { monitor.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop well before the next tick")
        .expect("task should not panic");
    assert!(result.is_ok());
    assert_eq!(queue.list().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_ticks_on_a_multi_thread_runtime() {
    let h = harness(MemorySource::at("m1"), &MonitorConfig::default());
    let queue = h.queue.clone();
    let mut monitor = h.monitor;
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { monitor.run(cancel).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor should stop well before the next tick")
        .expect("task should not panic");
    assert!(result.is_ok());
    assert_eq!(queue.list().len(), 2);
}
