//! Sequential task identifiers.
//!
//! Ids come from a per-store counter and are rendered as `Q-00001`. The
//! counter is persisted with the queue so an id is never handed out twice,
//! not even after the task holding it was deleted.

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Prefix for queued task ids.
pub const PREFIX_TASK: &str = "Q";

/// Minimum digit width of the numeric part.
const ID_WIDTH: usize = 5;

/// Identifier of a queued task. Ordering follows creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(u64);

impl TaskId {
    #[must_use]
    pub const fn from_sequence(sequence: u64) -> Self {
        Self(sequence)
    }

    /// The counter value this id was allocated from.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX_TASK}-{:0width$}", self.0, width = ID_WIDTH)
    }
}

impl FromStr for TaskId {
    type Err = CoreError;

    /// Accepts `Q-00042`, `q-42` and the bare number `42`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed
            .split_once('-')
            .filter(|(prefix, _)| prefix.eq_ignore_ascii_case(PREFIX_TASK))
            .map_or(trimmed, |(_, digits)| digits);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidTaskId(raw.to_string()));
        }

        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| CoreError::InvalidTaskId(raw.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

impl JsonSchema for TaskId {
    fn schema_name() -> Cow<'static, str> {
        "TaskId".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": "^Q-[0-9]{5,}$"
        })
    }
}
