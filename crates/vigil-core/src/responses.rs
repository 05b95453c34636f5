//! Response types returned as JSON by `vigil` commands and the queue API.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::QueuedTask;
use crate::enums::TaskStatus;

/// Task counts by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QueueStats {
    pub total: usize,
    pub by_status: BTreeMap<TaskStatus, usize>,
    pub pending: usize,
    pub waiting_approval: usize,
    pub in_progress: usize,
}

impl QueueStats {
    /// Tally a set of tasks.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a QueuedTask>) -> Self {
        let mut by_status = BTreeMap::new();
        let mut total = 0;
        for task in tasks {
            *by_status.entry(task.status()).or_insert(0) += 1;
            total += 1;
        }
        let count = |status: TaskStatus| by_status.get(&status).copied().unwrap_or(0);

        Self {
            total,
            pending: count(TaskStatus::Pending),
            waiting_approval: count(TaskStatus::WaitingApproval),
            in_progress: count(TaskStatus::InProgress),
            by_status,
        }
    }
}

/// Response from `vigil task <transition>`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransitionResponse {
    pub id: String,
    pub action: String,
    pub applied: bool,
    pub task: Option<QueuedTask>,
}

/// Response from `vigil task clear-completed`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ClearCompletedResponse {
    pub removed: usize,
}
