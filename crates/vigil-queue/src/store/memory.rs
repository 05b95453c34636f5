use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{QueueSnapshot, QueueStore};
use crate::error::StoreError;

/// In-process queue store.
///
/// Useful for tests and for embedding the queue where durability is handled
/// elsewhere. [`fail_saves`](Self::fail_saves) makes the next `n` saves fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: QueueSnapshot,
    failing_saves: usize,
    saves: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    #[must_use]
    pub fn with_snapshot(snapshot: QueueSnapshot) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                snapshot,
                ..MemoryInner::default()
            }),
        }
    }

    /// Make the next `n` calls to `save` fail with [`StoreError::Unavailable`].
    pub fn fail_saves(&self, n: usize) {
        self.lock().failing_saves = n;
    }

    /// The last successfully saved snapshot.
    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        self.lock().snapshot.clone()
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl QueueStore for MemoryStore {
    fn load(&self) -> Result<QueueSnapshot, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &QueueSnapshot) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.failing_saves > 0 {
            inner.failing_saves -= 1;
            return Err(StoreError::Unavailable("injected save failure".to_string()));
        }
        inner.snapshot = snapshot.clone();
        inner.saves += 1;
        Ok(())
    }
}
