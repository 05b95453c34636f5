//! Persisted monitor state: the revision watermark, trigger stamps and replay record.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vigil_queue::write_atomic;
use vigil_vcs::RevisionState;

use crate::error::MonitorError;
use crate::triggers::TriggerStamps;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default)]
    pub revision: RevisionState,
    #[serde(default)]
    pub clock: TriggerStamps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay: Option<ReplayGuard>,
}

/// Change tasks already stored for a revision whose watermark was rewound
/// after a partial enqueue failure. Replaying that revision skips them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayGuard {
    pub marker: String,
    pub stored_titles: Vec<String>,
}

impl ReplayGuard {
    /// Titles to skip when classifying `marker` again.
    #[must_use]
    pub fn stored_for(guard: Option<&Self>, marker: Option<&str>) -> Vec<String> {
        match (guard, marker) {
            (Some(guard), Some(marker)) if guard.marker == marker => guard.stored_titles.clone(),
            _ => Vec::new(),
        }
    }
}

/// JSON file holding a [`MonitorState`], replaced atomically on save.
#[derive(Debug, Clone)]
pub struct MonitorStateStore {
    path: PathBuf,
}

impl MonitorStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. A missing or unparseable file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::StateIo`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<MonitorState>, MonitorError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(MonitorError::StateIo {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "monitor state is corrupt, starting cold"
                );
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`MonitorError`] if the state could not be written.
    pub fn save(&self, state: &MonitorState) -> Result<(), MonitorError> {
        let mut json = serde_json::to_vec_pretty(state)?;
        json.push(b'\n');
        write_atomic(&self.path, &json).map_err(|source| MonitorError::StateIo {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), "monitor state saved");
        Ok(())
    }
}
