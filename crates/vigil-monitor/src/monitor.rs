//! The tick and the cancellable loop around it.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vigil_config::MonitorConfig;
use vigil_core::clock::Clock;
use vigil_core::entities::NewTask;
use vigil_core::ids::TaskId;
use vigil_queue::{QueueError, TaskQueue};
use vigil_vcs::ChangeDetector;

use crate::classifier::ChangeClassifier;
use crate::error::MonitorError;
use crate::state::{MonitorState, MonitorStateStore, ReplayGuard};
use crate::triggers::{PeriodicTrigger, SchedulerClock};

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub changes_detected: bool,
    pub changed_paths: usize,
    pub tasks_created: Vec<TaskId>,
    pub triggers_fired: Vec<PeriodicTrigger>,
    /// Enqueue attempts that failed because the queue could not be saved.
    pub store_failures: u32,
    pub pending: usize,
    pub waiting_approval: usize,
}

/// Background scheduler feeding the task queue.
pub struct Monitor {
    queue: Arc<TaskQueue>,
    detector: ChangeDetector,
    classifier: ChangeClassifier,
    triggers: SchedulerClock,
    clock: Arc<dyn Clock>,
    state_store: Option<MonitorStateStore>,
    replay: Option<ReplayGuard>,
    tick_interval: Duration,
    max_consecutive_store_failures: u32,
    consecutive_store_failures: u32,
}

impl Monitor {
    #[must_use]
    pub fn new(
        queue: Arc<TaskQueue>,
        detector: ChangeDetector,
        clock: Arc<dyn Clock>,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            queue,
            detector,
            classifier: ChangeClassifier::from_config(config),
            triggers: SchedulerClock::from_config(config),
            clock,
            state_store: None,
            replay: None,
            tick_interval: config.tick_interval(),
            max_consecutive_store_failures: config.max_consecutive_store_failures.max(1),
            consecutive_store_failures: 0,
        }
    }

    /// Persist the watermark, trigger stamps and replay record in `store`, resuming from
    /// whatever it already holds.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::StateIo`] if an existing state file cannot be
    /// read. A corrupt file is logged and ignored.
    pub fn with_state_store(mut self, store: MonitorStateStore) -> Result<Self, MonitorError> {
        if let Some(state) = store.load()? {
            info!(
                path = %store.path().display(),
                revision = state.revision.last_seen_revision.as_deref().unwrap_or("-"),
                "resuming monitor state"
            );
            self.detector = self.detector.with_state(state.revision);
            self.triggers = self.triggers.with_stamps(state.clock);
            self.replay = state.replay;
        }
        self.state_store = Some(store);
        Ok(self)
    }

    #[must_use]
    pub fn state(&self) -> MonitorState {
        MonitorState {
            revision: self.detector.state().clone(),
            clock: self.triggers.stamps().clone(),
            replay: self.replay.clone(),
        }
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one scheduling pass.
    ///
    /// The change path and the periodic triggers are independent: a failure
    /// in one never prevents the other from running.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Durability`] when the queue lock is poisoned or
    /// when saves have failed on `max_consecutive_store_failures` ticks in a
    /// row.
    pub fn tick(&mut self) -> Result<TickReport, MonitorError> {
        let mut report = TickReport::default();
        let mut last_store_error = None;

        // Pick up approvals and edits made by other processes since the last tick.
        if let Err(e) = self.queue.reload() {
            if e.is_fatal() {
                return Err(MonitorError::Durability {
                    consecutive_failures: self.consecutive_store_failures + 1,
                    last_error: e.to_string(),
                });
            }
            warn!(error = %e, "could not reload queue, continuing with in-memory state");
        }

        // Change-driven tasks
        let watermark = self.detector.state().clone();
        let delta = self.detector.poll();
        if delta.has_changes {
            report.changes_detected = true;
            report.changed_paths = delta.changed_paths.len();
            let marker = delta.new_marker.clone();
            let mut stored = ReplayGuard::stored_for(self.replay.as_ref(), marker.as_deref());
            let mut lost = false;
            for task in self.classifier.classify(&delta) {
                if stored.contains(&task.title) {
                    debug!(title = %task.title, "change task already stored for this revision");
                    continue;
                }
                let title = task.title.clone();
                match self.enqueue(task)? {
                    Ok(id) => {
                        report.tasks_created.push(id);
                        stored.push(title);
                    }
                    Err(e) => {
                        report.store_failures += 1;
                        last_store_error = Some(e);
                        lost = true;
                    }
                }
            }
            if lost {
                warn!("rewinding revision watermark so the change is retried next tick");
                self.detector.restore(watermark);
                self.replay = marker.map(|marker| ReplayGuard {
                    marker,
                    stored_titles: stored,
                });
            } else {
                self.replay = None;
            }
        }

        // Periodic triggers
        let now = self.clock.now();
        for trigger in PeriodicTrigger::ALL {
            if !self.triggers.is_due(trigger, now) {
                continue;
            }
            match self.enqueue(trigger.task(now))? {
                Ok(id) => {
                    self.triggers.mark_fired(trigger, now);
                    report.tasks_created.push(id);
                    report.triggers_fired.push(trigger);
                    info!(trigger = %trigger, task_id = %id, "periodic trigger fired");
                }
                Err(e) => {
                    report.store_failures += 1;
                    last_store_error = Some(e);
                }
            }
        }

        // Status line
        let stats = self.queue.stats();
        report.pending = stats.pending;
        report.waiting_approval = stats.waiting_approval;
        if stats.pending > 0 || stats.waiting_approval > 0 {
            info!(
                pending = stats.pending,
                waiting_approval = stats.waiting_approval,
                "queue status"
            );
        }

        // Watermark
        if let Some(store) = &self.state_store {
            if let Err(e) = store.save(&self.state()) {
                warn!(error = %e, "could not persist monitor state");
            }
        }

        match last_store_error {
            Some(e) => {
                self.consecutive_store_failures += 1;
                warn!(
                    consecutive = self.consecutive_store_failures,
                    budget = self.max_consecutive_store_failures,
                    error = %e,
                    "tick finished with store failures"
                );
                if self.consecutive_store_failures >= self.max_consecutive_store_failures {
                    return Err(MonitorError::Durability {
                        consecutive_failures: self.consecutive_store_failures,
                        last_error: e.to_string(),
                    });
                }
            }
            None => self.consecutive_store_failures = 0,
        }

        Ok(report)
    }

    /// Run ticks every `tick_interval` until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MonitorError`] raised by [`Self::tick`].
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), MonitorError> {
        info!(
            interval_secs = self.tick_interval.as_secs(),
            "monitor started"
        );
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.tick_blocking() {
                Ok(report) => debug!(?report, "tick finished"),
                Err(e) => {
                    error!(error = %e, "monitor stopping");
                    return Err(e);
                }
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.tick_interval) => {}
            }
        }
        info!("monitor stopped");
        Ok(())
    }

    /// The tick does blocking git and file I/O. On a multi-thread runtime the
    /// worker hands its other tasks off first; a current-thread runtime has
    /// no other worker to hand them to.
    fn tick_blocking(&mut self) -> Result<TickReport, MonitorError> {
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => block_in_place(|| self.tick()),
            _ => self.tick(),
        }
    }

    /// Outer error: the queue is unusable. Inner error: this save failed.
    fn enqueue(&self, task: NewTask) -> Result<Result<TaskId, QueueError>, MonitorError> {
        match self.queue.add(task) {
            Ok(task) => Ok(Ok(task.id())),
            Err(e) if e.is_fatal() => Err(MonitorError::Durability {
                consecutive_failures: self.consecutive_store_failures + 1,
                last_error: e.to_string(),
            }),
            Err(e) => {
                warn!(error = %e, "could not enqueue task");
                Ok(Err(e))
            }
        }
    }
}
