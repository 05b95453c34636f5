//! Poll-based change detection against a stored revision watermark.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vigil_core::clock::Clock;

use crate::source::VersionedSource;

/// Watermark kept between polls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevisionState {
    pub last_seen_revision: Option<String>,
    pub last_check_time: Option<DateTime<Utc>>,
}

/// Outcome of one [`ChangeDetector::poll`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeDelta {
    pub has_changes: bool,
    pub previous_marker: Option<String>,
    pub new_marker: Option<String>,
    pub changed_paths: Vec<String>,
}

impl ChangeDelta {
    fn unchanged(marker: Option<String>) -> Self {
        Self {
            has_changes: false,
            previous_marker: marker.clone(),
            new_marker: marker,
            changed_paths: Vec::new(),
        }
    }
}

/// Compares a source's current marker with the last one seen.
///
/// The watermark only moves forward after the changed paths were listed
/// successfully, so a failing source never loses a change: the same delta is
/// reported on the first poll after the source recovers.
pub struct ChangeDetector {
    source: Arc<dyn VersionedSource>,
    clock: Arc<dyn Clock>,
    state: RevisionState,
}

impl ChangeDetector {
    #[must_use]
    pub fn new(source: Arc<dyn VersionedSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            state: RevisionState::default(),
        }
    }

    /// Resume from a previously persisted watermark.
    #[must_use]
    pub fn with_state(mut self, state: RevisionState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &RevisionState {
        &self.state
    }

    /// Put the watermark back, e.g. when the tasks derived from the last
    /// delta could not be stored.
    pub fn restore(&mut self, state: RevisionState) {
        self.state = state;
    }

    /// Check the source once.
    ///
    /// Never fails: source errors are logged and reported as "no changes"
    /// with the watermark untouched.
    pub fn poll(&mut self) -> ChangeDelta {
        let previous = self.state.last_seen_revision.clone();

        let current = match self.source.current_marker() {
            Ok(marker) => marker,
            Err(e) => {
                warn!(error = %e, "could not read current revision");
                return ChangeDelta::unchanged(previous);
            }
        };
        let now = self.clock.now();

        let Some(current) = current else {
            debug!("source has no revisions yet");
            self.state.last_check_time = Some(now);
            return ChangeDelta::unchanged(previous);
        };

        let Some(previous) = previous else {
            info!(revision = %current, "recording initial revision");
            self.state.last_seen_revision = Some(current.clone());
            self.state.last_check_time = Some(now);
            return ChangeDelta {
                has_changes: false,
                previous_marker: None,
                new_marker: Some(current),
                changed_paths: Vec::new(),
            };
        };

        if previous == current {
            self.state.last_check_time = Some(now);
            return ChangeDelta::unchanged(Some(previous));
        }

        match self.source.paths_changed(Some(&previous)) {
            Ok(changed_paths) => {
                info!(
                    from = %previous,
                    to = %current,
                    paths = changed_paths.len(),
                    "new revision detected"
                );
                self.state.last_seen_revision = Some(current.clone());
                self.state.last_check_time = Some(now);
                ChangeDelta {
                    has_changes: true,
                    previous_marker: Some(previous),
                    new_marker: Some(current),
                    changed_paths,
                }
            }
            Err(e) => {
                warn!(
                    from = %previous,
                    to = %current,
                    error = %e,
                    "could not list changed paths, will retry next poll"
                );
                ChangeDelta::unchanged(Some(previous))
            }
        }
    }
}
