//! Durable queue storage.
//!
//! A [`QueueStore`] loads and saves a whole [`QueueSnapshot`] at once. The
//! queue never writes partial state: it stages a full snapshot, saves it, and
//! only then commits it in memory.

mod atomic;
mod json_file;
mod memory;

pub use atomic::write_atomic;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vigil_core::entities::QueuedTask;

use crate::error::StoreError;

/// Everything a store needs to reproduce the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Highest id sequence ever allocated.
    pub counter: u64,
    pub tasks: Vec<QueuedTask>,
}

/// Persistence port for the task queue.
pub trait QueueStore: Send + Sync {
    /// Load the last saved snapshot. A store with no prior state returns an
    /// empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing storage cannot be read.
    fn load(&self) -> Result<QueueSnapshot, StoreError>;

    /// Replace the stored snapshot. Must be all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the snapshot was not durably written.
    fn save(&self, snapshot: &QueueSnapshot) -> Result<(), StoreError>;
}

/// On-disk document written by [`JsonFileStore`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersistedQueue {
    #[serde(default)]
    pub counter: u64,
    #[serde(default)]
    pub tasks: Vec<QueuedTask>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PersistedQueue {
    /// JSON schema of the queue file.
    #[must_use]
    pub fn schema() -> schemars::Schema {
        schemars::schema_for!(Self)
    }
}

impl From<PersistedQueue> for QueueSnapshot {
    fn from(doc: PersistedQueue) -> Self {
        Self {
            counter: doc.counter,
            tasks: doc.tasks,
        }
    }
}
