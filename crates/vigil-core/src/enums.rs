//! Status, priority and task-type enums for Vigil.
//!
//! String-valued enums use `snake_case` serialization via
//! `#[serde(rename_all = "snake_case")]`. [`TaskStatus`] carries the state
//! machine: `allowed_next_states()` is the transition table and every queue
//! mutation goes through a [`TaskAction`] checked against it.

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status of a queued task.
///
/// ```text
/// pending → in_progress → waiting_approval → approved → completed
///         ↘───────────────↗               ↘ rejected
/// any non-terminal → completed | failed
/// ```
///
/// `in_progress` is optional: a consumer may propose changes or complete a
/// task straight from `pending`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    WaitingApproval,
    Approved,
    Completed,
    Failed,
    Rejected,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::InProgress,
        Self::WaitingApproval,
        Self::Approved,
        Self::Completed,
        Self::Failed,
        Self::Rejected,
    ];

    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[
                Self::InProgress,
                Self::WaitingApproval,
                Self::Completed,
                Self::Failed,
            ],
            Self::InProgress => &[Self::WaitingApproval, Self::Completed, Self::Failed],
            Self::WaitingApproval => &[
                Self::Approved,
                Self::Rejected,
                Self::Completed,
                Self::Failed,
            ],
            Self::Approved => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed | Self::Rejected => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Terminal states never transition again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Rejected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::WaitingApproval => "waiting_approval",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskAction
// ---------------------------------------------------------------------------

/// A status-changing operation on a task.
///
/// Each action has a single target status; it is legal exactly when the
/// current status may transition to that target. `Propose` additionally
/// requires the task to be `pending` or `in_progress`, which the table already
/// encodes because `waiting_approval` is only reachable from those two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskAction {
    Start,
    Propose,
    Approve,
    Reject,
    Complete,
    Fail,
}

impl TaskAction {
    /// The status this action moves a task into.
    #[must_use]
    pub const fn target(self) -> TaskStatus {
        match self {
            Self::Start => TaskStatus::InProgress,
            Self::Propose => TaskStatus::WaitingApproval,
            Self::Approve => TaskStatus::Approved,
            Self::Reject => TaskStatus::Rejected,
            Self::Complete => TaskStatus::Completed,
            Self::Fail => TaskStatus::Failed,
        }
    }

    /// Resolve the next status for `current`, or `None` when illegal.
    #[must_use]
    pub fn apply(self, current: TaskStatus) -> Option<TaskStatus> {
        let next = self.target();
        current.can_transition_to(next).then_some(next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Propose => "propose",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Complete => "complete",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskPriority
// ---------------------------------------------------------------------------

/// Priority of a queued task. Serialized as its numeric rank (0-3).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl TaskPriority {
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Normal => 1,
            Self::High => 2,
            Self::Critical => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse either a name (`high`) or a rank (`2`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for anything else.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" | "0" => Ok(Self::Low),
            "normal" | "1" => Ok(Self::Normal),
            "high" | "2" => Ok(Self::High),
            "critical" | "3" => Ok(Self::Critical),
            _ => Err(CoreError::Validation(format!("unknown priority '{raw}'"))),
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority.rank()
    }
}

impl TryFrom<u8> for TaskPriority {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            3 => Ok(Self::Critical),
            other => Err(CoreError::Validation(format!(
                "priority rank {other} out of range 0..=3"
            ))),
        }
    }
}

impl JsonSchema for TaskPriority {
    fn schema_name() -> Cow<'static, str> {
        "TaskPriority".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "integer",
            "minimum": 0,
            "maximum": 3,
            "description": "Priority rank: 0 = low, 1 = normal, 2 = high, 3 = critical"
        })
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskType
// ---------------------------------------------------------------------------

/// Kind of work a task represents. Informational only.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    CodeReview,
    SecurityScan,
    #[default]
    Improvement,
    BugFix,
    Feature,
    Documentation,
    Monitoring,
}

impl TaskType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CodeReview => "code_review",
            Self::SecurityScan => "security_scan",
            Self::Improvement => "improvement",
            Self::BugFix => "bug_fix",
            Self::Feature => "feature",
            Self::Documentation => "documentation",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
