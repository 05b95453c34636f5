use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::NewTask;
use crate::enums::{TaskAction, TaskPriority, TaskStatus, TaskType};
use crate::errors::CoreError;
use crate::ids::TaskId;

/// Opaque caller-supplied context attached to a task.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A unit of schedulable work.
///
/// Fields are private: the status only moves through the transition methods,
/// each of which validates against [`TaskStatus::allowed_next_states`] before
/// touching anything, so a rejected call leaves the record unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct QueuedTask {
    id: TaskId,
    title: String,
    description: String,
    task_type: TaskType,
    priority: TaskPriority,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    assigned_agent: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    proposed_changes: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

impl QueuedTask {
    /// Create a `pending` task from caller input.
    #[must_use]
    pub fn new(id: TaskId, input: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            task_type: input.task_type,
            priority: input.priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            assigned_agent: None,
            result: None,
            proposed_changes: None,
            metadata: input.metadata,
        }
    }

    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn task_type(&self) -> TaskType {
        self.task_type
    }

    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn assigned_agent(&self) -> Option<&str> {
        self.assigned_agent.as_deref()
    }

    #[must_use]
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    #[must_use]
    pub fn proposed_changes(&self) -> Option<&[serde_json::Value]> {
        self.proposed_changes.as_deref()
    }

    #[must_use]
    pub const fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// `pending → in_progress`, optionally recording the working agent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless the task is `pending`.
    pub fn start(&mut self, agent: Option<&str>, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(TaskAction::Start, now)?;
        if let Some(agent) = agent {
            self.assigned_agent = Some(agent.to_string());
        }
        Ok(())
    }

    /// Attach proposed changes and park the task at the approval gate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless the task is `pending`
    /// or `in_progress`.
    pub fn propose_changes(
        &mut self,
        changes: Vec<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.transition(TaskAction::Propose, now)?;
        self.proposed_changes = Some(changes);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless the task is
    /// `waiting_approval`.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(TaskAction::Approve, now)
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] unless the task is
    /// `waiting_approval`.
    pub fn reject(&mut self, reason: Option<&str>, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(TaskAction::Reject, now)?;
        self.result = Some(labelled("Rejected", reason));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when the task is terminal.
    pub fn complete(&mut self, result: Option<&str>, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(TaskAction::Complete, now)?;
        if let Some(result) = result.filter(|r| !r.trim().is_empty()) {
            self.result = Some(result.to_string());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when the task is terminal.
    pub fn fail(&mut self, error: Option<&str>, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition(TaskAction::Fail, now)?;
        self.result = Some(labelled("Error", error));
        Ok(())
    }

    fn transition(&mut self, action: TaskAction, now: DateTime<Utc>) -> Result<(), CoreError> {
        let next = action
            .apply(self.status)
            .ok_or_else(|| CoreError::InvalidTransition {
                id: self.id.to_string(),
                from: self.status.to_string(),
                action: action.to_string(),
            })?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

fn labelled(label: &str, detail: Option<&str>) -> String {
    match detail.map(str::trim).filter(|d| !d.is_empty()) {
        Some(detail) => format!("{label}: {detail}"),
        None => label.to_string(),
    }
}
