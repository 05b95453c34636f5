//! Error types for the queue and its stores.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised by a [`QueueStore`](crate::QueueStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading, writing, or renaming the backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The store refused the operation (used by in-process stores).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether retrying the same operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Unavailable(_))
    }
}

/// Errors returned by [`TaskQueue`](crate::TaskQueue).
#[derive(Debug, Error)]
pub enum QueueError {
    /// The store failed to load or persist the queue.
    #[error("Queue store error: {0}")]
    Store(#[from] StoreError),

    /// A previous holder of the queue lock panicked.
    #[error("Queue lock poisoned")]
    Poisoned,
}

impl QueueError {
    /// Whether the queue can no longer guarantee durability at all.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Poisoned)
    }
}
