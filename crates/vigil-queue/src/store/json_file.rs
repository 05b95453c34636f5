use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use vigil_core::clock::{Clock, SystemClock};
use vigil_core::entities::QueuedTask;

use super::atomic::{parent_dir, write_atomic};
use super::{PersistedQueue, QueueSnapshot, QueueStore};
use crate::error::StoreError;

/// Borrowed form of [`PersistedQueue`] so saving does not clone every task.
#[derive(Serialize)]
struct PersistedQueueRef<'a> {
    counter: u64,
    tasks: &'a [QueuedTask],
    last_updated: DateTime<Utc>,
}

/// Queue store backed by a single JSON file.
///
/// Saves go through [`write_atomic`], so readers see either the old document
/// or the new one. A file that fails to parse is moved aside to
/// `<file>.corrupt-<timestamp>` and the store starts empty.
pub struct JsonFileStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    /// Create a store at `path`, creating the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the parent directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let dir = parent_dir(&path);
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        Ok(Self {
            path,
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for `last_updated` stamps and quarantine file names.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move an unparseable queue file out of the way, keeping its bytes.
    fn quarantine(&self) -> Option<PathBuf> {
        let stamp = self.clock.now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("queue.json"));
        name.push(format!(".corrupt-{stamp}"));
        let target = self.path.with_file_name(name);

        match fs::rename(&self.path, &target) {
            Ok(()) => Some(target),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not move corrupt queue file aside"
                );
                None
            }
        }
    }
}

impl QueueStore for JsonFileStore {
    fn load(&self) -> Result<QueueSnapshot, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no queue file yet, starting empty");
                return Ok(QueueSnapshot::default());
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        match serde_json::from_slice::<PersistedQueue>(&bytes) {
            Ok(doc) => Ok(doc.into()),
            Err(e) => {
                let moved_to = self.quarantine();
                warn!(
                    path = %self.path.display(),
                    moved_to = ?moved_to,
                    error = %e,
                    "queue file is corrupt, starting with an empty queue"
                );
                Ok(QueueSnapshot::default())
            }
        }
    }

    fn save(&self, snapshot: &QueueSnapshot) -> Result<(), StoreError> {
        let doc = PersistedQueueRef {
            counter: snapshot.counter,
            tasks: &snapshot.tasks,
            last_updated: self.clock.now(),
        };
        let mut json = serde_json::to_vec_pretty(&doc)?;
        json.push(b'\n');

        write_atomic(&self.path, &json).map_err(|e| StoreError::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            tasks = snapshot.tasks.len(),
            counter = snapshot.counter,
            "queue saved"
        );
        Ok(())
    }
}
