//! The task queue and its approval gate.
//!
//! Every mutating call runs the full read → validate → stage → persist →
//! commit sequence under one mutex. The staged state replaces the in-memory
//! index only after the store accepted it, so a failed save leaves both memory
//! and disk exactly as they were.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use vigil_core::clock::Clock;
use vigil_core::entities::{NewTask, QueuedTask};
use vigil_core::enums::{TaskAction, TaskStatus};
use vigil_core::errors::CoreError;
use vigil_core::ids::TaskId;
use vigil_core::responses::QueueStats;

use crate::error::{QueueError, StoreError};
use crate::retry::RetryConfig;
use crate::store::{QueueSnapshot, QueueStore};

#[derive(Debug, Clone, Default)]
struct QueueState {
    counter: u64,
    tasks: BTreeMap<TaskId, QueuedTask>,
}

impl QueueState {
    /// Rebuild the index from a stored snapshot. The counter never drops
    /// below `floor`, the stored counter, or the highest id present.
    fn from_snapshot(snapshot: QueueSnapshot, floor: u64) -> Self {
        let highest_id = snapshot
            .tasks
            .iter()
            .map(|t| t.id().sequence())
            .max()
            .unwrap_or(0);
        if highest_id > snapshot.counter {
            warn!(
                stored_counter = snapshot.counter,
                highest_id, "queue counter is behind its tasks, advancing it"
            );
        }

        let mut tasks = BTreeMap::new();
        for task in snapshot.tasks {
            if let Some(dup) = tasks.insert(task.id(), task) {
                warn!(task_id = %dup.id(), "duplicate task id in stored queue, keeping the later record");
            }
        }

        Self {
            counter: snapshot.counter.max(highest_id).max(floor),
            tasks,
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            counter: self.counter,
            tasks: self.tasks.values().cloned().collect(),
        }
    }

    fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &QueuedTask> {
        self.tasks.values().filter(move |t| t.status() == status)
    }
}

/// Durable, priority-ordered work queue.
///
/// Share it as `Arc<TaskQueue>`; all methods take `&self`.
pub struct TaskQueue {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
    state: Mutex<QueueState>,
}

impl TaskQueue {
    /// Load the queue from `store`.
    ///
    /// The id counter resumes at the larger of the stored counter and the
    /// highest id present, so ids are never handed out twice.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Store`] if the store cannot be read.
    pub fn open(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>) -> Result<Self, QueueError> {
        let state = QueueState::from_snapshot(store.load()?, 0);
        info!(tasks = state.tasks.len(), counter = state.counter, "task queue opened");

        Ok(Self {
            store,
            clock,
            retry: RetryConfig::default(),
            state: Mutex::new(state),
        })
    }

    /// Override the retry policy used for saves.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Re-read the store, picking up changes written by another process.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the store cannot be read; the in-memory
    /// state is kept in that case.
    pub fn reload(&self) -> Result<(), QueueError> {
        let mut state = self.lock()?;
        let snapshot = self.store.load()?;
        *state = QueueState::from_snapshot(snapshot, state.counter);
        debug!(tasks = state.tasks.len(), "task queue reloaded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Enqueue a new `pending` task and return the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Store`] if the task could not be persisted; the
    /// id counter is not advanced in that case.
    pub fn add(&self, input: NewTask) -> Result<QueuedTask, QueueError> {
        let mut state = self.lock()?;
        let mut staged = state.clone();
        staged.counter += 1;
        let task = QueuedTask::new(
            TaskId::from_sequence(staged.counter),
            input,
            self.clock.now(),
        );
        staged.tasks.insert(task.id(), task.clone());
        self.persist(&staged)?;
        *state = staged;
        drop(state);

        info!(
            task_id = %task.id(),
            task_type = %task.task_type(),
            priority = %task.priority(),
            title = task.title(),
            "task added"
        );
        Ok(task)
    }

    /// `pending → in_progress`, recording `agent` when given.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails; an unknown id or an
    /// illegal transition yields `Ok(false)`.
    pub fn start(&self, id: TaskId, agent: Option<&str>) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Start, |task, now| task.start(agent, now))
    }

    /// Attach proposed changes and move the task to `waiting_approval`.
    /// Allowed from `pending` and `in_progress`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn set_proposed_changes(&self, id: TaskId, changes: Vec<Value>) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Propose, |task, now| {
            task.propose_changes(changes, now)
        })
    }

    /// `waiting_approval → approved`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn approve(&self, id: TaskId) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Approve, |task, now| task.approve(now))
    }

    /// `waiting_approval → rejected`, recording the reason.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn reject(&self, id: TaskId, reason: Option<&str>) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Reject, |task, now| task.reject(reason, now))
    }

    /// Any non-terminal status → `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn complete(&self, id: TaskId, result: Option<&str>) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Complete, |task, now| task.complete(result, now))
    }

    /// Any non-terminal status → `failed`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn fail(&self, id: TaskId, error: Option<&str>) -> Result<bool, QueueError> {
        self.transition(id, TaskAction::Fail, |task, now| task.fail(error, now))
    }

    /// Remove a task in any status. Its id is never reused.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn delete(&self, id: TaskId) -> Result<bool, QueueError> {
        let removed = self.mutate(|state, _| state.tasks.remove(&id))?;
        match removed {
            Some(task) => {
                info!(task_id = %id, status = %task.status(), "task deleted");
                Ok(true)
            }
            None => {
                debug!(task_id = %id, "delete: task not found");
                Ok(false)
            }
        }
    }

    /// Remove every `completed` task and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] only when persisting fails.
    pub fn clear_completed(&self) -> Result<usize, QueueError> {
        let removed = self.mutate(|state, _| {
            let before = state.tasks.len();
            state
                .tasks
                .retain(|_, task| task.status() != TaskStatus::Completed);
            let removed = before - state.tasks.len();
            (removed > 0).then_some(removed)
        })?;
        let removed = removed.unwrap_or(0);
        if removed > 0 {
            info!(removed, "completed tasks cleared");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<QueuedTask> {
        self.read().tasks.get(&id).cloned()
    }

    /// Pending tasks, highest priority first, then oldest first.
    #[must_use]
    pub fn get_pending(&self) -> Vec<QueuedTask> {
        let mut pending: Vec<QueuedTask> =
            self.read().with_status(TaskStatus::Pending).cloned().collect();
        // Stable sort keeps id (creation) order within a priority.
        pending.sort_by_key(|t| Reverse(t.priority()));
        pending
    }

    /// Tasks parked at the approval gate, oldest first.
    #[must_use]
    pub fn get_waiting_approval(&self) -> Vec<QueuedTask> {
        self.get_by_status(TaskStatus::WaitingApproval)
    }

    /// Tasks in `status`, oldest first.
    #[must_use]
    pub fn get_by_status(&self, status: TaskStatus) -> Vec<QueuedTask> {
        self.read().with_status(status).cloned().collect()
    }

    /// Every task, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<QueuedTask> {
        self.read().tasks.values().cloned().collect()
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats::from_tasks(self.read().tasks.values())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn transition<F>(&self, id: TaskId, action: TaskAction, apply: F) -> Result<bool, QueueError>
    where
        F: FnOnce(&mut QueuedTask, DateTime<Utc>) -> Result<(), CoreError>,
    {
        let applied = self.mutate(|state, now| {
            let Some(task) = state.tasks.get_mut(&id) else {
                debug!(task_id = %id, action = %action, "task not found");
                return None;
            };
            match apply(task, now) {
                Ok(()) => Some(task.status()),
                Err(err) => {
                    debug!(task_id = %id, action = %action, error = %err, "transition refused");
                    None
                }
            }
        })?;

        let Some(status) = applied else {
            return Ok(false);
        };
        info!(task_id = %id, action = %action, status = %status, "task transitioned");
        Ok(true)
    }

    /// Stage a change on a copy of the state, persist it, then commit it.
    ///
    /// `f` returning `None` means "nothing to do": no save happens and the
    /// state is untouched.
    fn mutate<T, F>(&self, f: F) -> Result<Option<T>, QueueError>
    where
        F: FnOnce(&mut QueueState, DateTime<Utc>) -> Option<T>,
    {
        let mut guard = self.lock()?;
        let now = self.clock.now();

        let mut staged = guard.clone();
        let Some(out) = f(&mut staged, now) else {
            return Ok(None);
        };
        self.persist(&staged)?;
        *guard = staged;
        Ok(Some(out))
    }

    fn persist(&self, staged: &QueueState) -> Result<(), QueueError> {
        let snapshot = staged.snapshot();
        self.retry
            .run("queue save", || self.store.save(&snapshot), StoreError::is_transient)
            .inspect_err(|e| warn!(error = %e, "queue save failed, change discarded"))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState>, QueueError> {
        self.state.lock().map_err(|_| QueueError::Poisoned)
    }

    /// Reads tolerate a poisoned lock: committed state is always consistent
    /// because it is only ever replaced wholesale.
    fn read(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use vigil_core::clock::ManualClock;
    use vigil_core::enums::TaskPriority;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap(),
        ))
    }

    fn queue_with(store: Arc<MemoryStore>) -> TaskQueue {
        TaskQueue::open(store, clock())
            .unwrap()
            .with_retry(RetryConfig::no_retry())
    }

    fn queue() -> (TaskQueue, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (queue_with(store.clone()), store)
    }

    fn waiting(queue: &TaskQueue) -> TaskId {
        let id = queue.add(NewTask::new("t", "d")).unwrap().id();
        assert!(queue.set_proposed_changes(id, vec![serde_json::json!({"file": "a.rs"})]).unwrap());
        id
    }

    #[test]
    fn add_assigns_sequential_ids_and_persists() {
        let (queue, store) = queue();
        let a = queue.add(NewTask::new("a", "")).unwrap();
        let b = queue.add(NewTask::new("b", "")).unwrap();

        assert_eq!(a.id().to_string(), "Q-00001");
        assert_eq!(b.id().to_string(), "Q-00002");
        assert_eq!(a.status(), TaskStatus::Pending);
        assert_eq!(store.snapshot().counter, 2);
        assert_eq!(store.snapshot().tasks.len(), 2);
    }

    #[test]
    fn pending_is_sorted_by_priority_then_creation() {
        let (queue, _) = queue();
        for priority in [
            TaskPriority::Low,
            TaskPriority::Critical,
            TaskPriority::Normal,
            TaskPriority::Critical,
        ] {
            queue.add(NewTask::new("t", "").priority(priority)).unwrap();
        }

        let order: Vec<String> = queue
            .get_pending()
            .iter()
            .map(|t| t.id().to_string())
            .collect();
        assert_eq!(order, vec!["Q-00002", "Q-00004", "Q-00003", "Q-00001"]);
    }

    #[test]
    fn approve_on_pending_returns_false_and_changes_nothing() {
        let (queue, store) = queue();
        let task = queue.add(NewTask::new("t", "")).unwrap();
        let saves = store.save_count();

        assert!(!queue.approve(task.id()).unwrap());
        assert_eq!(queue.get(task.id()).unwrap(), task);
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn unknown_id_returns_false() {
        let (queue, _) = queue();
        let ghost = TaskId::from_sequence(99);
        assert!(!queue.approve(ghost).unwrap());
        assert!(!queue.complete(ghost, None).unwrap());
        assert!(!queue.delete(ghost).unwrap());
        assert!(queue.get(ghost).is_none());
    }

    #[test]
    fn approval_gate_flow() {
        let (queue, _) = queue();
        let id = waiting(&queue);
        assert_eq!(queue.get_waiting_approval().len(), 1);

        assert!(queue.approve(id).unwrap());
        assert_eq!(queue.get(id).unwrap().status(), TaskStatus::Approved);
        assert!(queue.get_waiting_approval().is_empty());

        assert!(queue.complete(id, Some("merged")).unwrap());
        let done = queue.get(id).unwrap();
        assert_eq!(done.status(), TaskStatus::Completed);
        assert_eq!(done.result(), Some("merged"));
    }

    #[rstest]
    #[case(Some("too risky"), "Rejected: too risky")]
    #[case(None, "Rejected")]
    fn reject_records_reason(#[case] reason: Option<&str>, #[case] expected: &str) {
        let (queue, _) = queue();
        let id = waiting(&queue);
        assert!(queue.reject(id, reason).unwrap());
        let task = queue.get(id).unwrap();
        assert_eq!(task.status(), TaskStatus::Rejected);
        assert_eq!(task.result(), Some(expected));
    }

    #[test]
    fn propose_from_in_progress_is_allowed() {
        let (queue, _) = queue();
        let id = queue.add(NewTask::new("t", "")).unwrap().id();
        assert!(queue.start(id, Some("developer")).unwrap());
        assert!(queue.set_proposed_changes(id, Vec::new()).unwrap());

        let task = queue.get(id).unwrap();
        assert_eq!(task.status(), TaskStatus::WaitingApproval);
        assert_eq!(task.assigned_agent(), Some("developer"));
    }

    #[test]
    fn propose_from_approved_is_refused() {
        let (queue, _) = queue();
        let id = waiting(&queue);
        queue.approve(id).unwrap();
        assert!(!queue.set_proposed_changes(id, Vec::new()).unwrap());
        assert_eq!(queue.get(id).unwrap().status(), TaskStatus::Approved);
    }

    #[test]
    fn terminal_tasks_are_immutable() {
        let (queue, _) = queue();
        let id = queue.add(NewTask::new("t", "")).unwrap().id();
        assert!(queue.fail(id, Some("boom")).unwrap());
        let failed = queue.get(id).unwrap();

        assert!(!queue.start(id, None).unwrap());
        assert!(!queue.set_proposed_changes(id, Vec::new()).unwrap());
        assert!(!queue.approve(id).unwrap());
        assert!(!queue.reject(id, None).unwrap());
        assert!(!queue.complete(id, None).unwrap());
        assert!(!queue.fail(id, None).unwrap());
        assert_eq!(queue.get(id).unwrap(), failed);
        assert_eq!(failed.result(), Some("Error: boom"));
    }

    #[test]
    fn failed_save_leaves_memory_and_store_unchanged() {
        let (queue, store) = queue();
        let id = queue.add(NewTask::new("t", "")).unwrap().id();
        let before = store.snapshot();

        store.fail_saves(1);
        let err = queue.add(NewTask::new("lost", "")).unwrap_err();
        assert!(matches!(err, QueueError::Store(_)));
        assert_eq!(queue.list().len(), 1);
        assert_eq!(store.snapshot(), before);

        store.fail_saves(1);
        assert!(queue.complete(id, None).is_err());
        assert_eq!(queue.get(id).unwrap().status(), TaskStatus::Pending);

        // The counter did not advance on the failed add.
        let next = queue.add(NewTask::new("next", "")).unwrap();
        assert_eq!(next.id().to_string(), "Q-00002");
    }

    #[test]
    fn transient_save_failures_are_retried() {
        let store = Arc::new(MemoryStore::new());
        let queue = TaskQueue::open(store.clone(), clock())
            .unwrap()
            .with_retry(RetryConfig {
                max_attempts: 3,
                base_delay: std::time::Duration::from_millis(1),
                max_delay: std::time::Duration::from_millis(2),
            });

        store.fail_saves(2);
        let task = queue.add(NewTask::new("t", "")).unwrap();
        assert_eq!(store.snapshot().tasks, vec![task]);
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let (queue, _) = queue();
        let first = queue.add(NewTask::new("a", "")).unwrap().id();
        let second = queue.add(NewTask::new("b", "")).unwrap().id();
        assert!(queue.delete(second).unwrap());
        assert!(queue.delete(first).unwrap());

        let third = queue.add(NewTask::new("c", "")).unwrap();
        assert_eq!(third.id().to_string(), "Q-00003");
    }

    #[test]
    fn clear_completed_removes_only_completed() {
        let (queue, _) = queue();
        let a = queue.add(NewTask::new("a", "")).unwrap().id();
        let b = queue.add(NewTask::new("b", "")).unwrap().id();
        let c = queue.add(NewTask::new("c", "")).unwrap().id();
        queue.complete(a, None).unwrap();
        queue.complete(b, None).unwrap();
        queue.fail(c, None).unwrap();

        assert_eq!(queue.clear_completed().unwrap(), 2);
        assert_eq!(queue.list().len(), 1);
        assert_eq!(queue.clear_completed().unwrap(), 0);
    }

    #[test]
    fn stats_count_by_status() {
        let (queue, _) = queue();
        queue.add(NewTask::new("a", "")).unwrap();
        let b = queue.add(NewTask::new("b", "")).unwrap().id();
        let c = waiting(&queue);
        queue.start(b, None).unwrap();
        queue.approve(c).unwrap();

        let stats = queue.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.waiting_approval, 0);
        assert_eq!(stats.by_status.get(&TaskStatus::Approved), Some(&1));
    }

    #[test]
    fn stale_counter_is_advanced_past_loaded_ids() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let store = Arc::new(MemoryStore::with_snapshot(QueueSnapshot {
            counter: 1,
            tasks: vec![QueuedTask::new(
                TaskId::from_sequence(7),
                NewTask::new("old", ""),
                now,
            )],
        }));
        let queue = queue_with(store);
        assert_eq!(queue.add(NewTask::new("new", "")).unwrap().id().to_string(), "Q-00008");
    }

    #[test]
    fn reload_picks_up_external_writes_and_keeps_counter() {
        let store = Arc::new(MemoryStore::new());
        let ours = queue_with(store.clone());
        let theirs = queue_with(store.clone());

        let id = ours.add(NewTask::new("a", "")).unwrap().id();
        ours.add(NewTask::new("b", "")).unwrap();
        theirs.reload().unwrap();
        assert!(theirs.set_proposed_changes(id, Vec::new()).unwrap());

        ours.reload().unwrap();
        assert_eq!(ours.get(id).unwrap().status(), TaskStatus::WaitingApproval);
        assert_eq!(ours.add(NewTask::new("c", "")).unwrap().id().to_string(), "Q-00003");
    }

    #[test]
    fn updated_at_follows_the_clock() {
        let store = Arc::new(MemoryStore::new());
        let clock = clock();
        let queue = TaskQueue::open(store, clock.clone()).unwrap();
        let task = queue.add(NewTask::new("t", "")).unwrap();

        clock.advance(chrono::Duration::minutes(5));
        queue.start(task.id(), None).unwrap();
        let started = queue.get(task.id()).unwrap();
        assert_eq!(started.created_at(), task.created_at());
        assert_eq!(
            started.updated_at(),
            task.created_at() + chrono::Duration::minutes(5)
        );
    }
}
