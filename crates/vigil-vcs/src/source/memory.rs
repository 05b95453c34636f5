use std::sync::{Mutex, MutexGuard, PoisonError};

use super::VersionedSource;
use crate::error::VcsError;

/// In-process versioned source driven by the caller.
///
/// [`commit`](Self::commit) moves the marker and sets the paths reported by
/// the next diff; [`set_failing`](Self::set_failing) makes every call fail
/// and [`fail_diffs`](Self::fail_diffs) only the path listing.
#[derive(Debug, Default)]
pub struct MemorySource {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    marker: Option<String>,
    paths: Vec<String>,
    failing: bool,
    diffs_failing: bool,
    diff_calls: usize,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `marker` with nothing changed.
    #[must_use]
    pub fn at(marker: &str) -> Self {
        let source = Self::new();
        source.lock().marker = Some(marker.to_string());
        source
    }

    /// Move to `marker`, reporting `paths` as changed.
    pub fn commit<I, S>(&self, marker: &str, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.lock();
        inner.marker = Some(marker.to_string());
        inner.paths = paths.into_iter().map(Into::into).collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn fail_diffs(&self, failing: bool) {
        self.lock().diffs_failing = failing;
    }

    /// How many times `paths_changed` was called.
    #[must_use]
    pub fn diff_calls(&self) -> usize {
        self.lock().diff_calls
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VersionedSource for MemorySource {
    fn current_marker(&self) -> Result<Option<String>, VcsError> {
        let inner = self.lock();
        if inner.failing {
            return Err(VcsError::Unavailable("source marked as failing".to_string()));
        }
        Ok(inner.marker.clone())
    }

    fn paths_changed(&self, _since: Option<&str>) -> Result<Vec<String>, VcsError> {
        let mut inner = self.lock();
        inner.diff_calls += 1;
        if inner.failing || inner.diffs_failing {
            return Err(VcsError::Unavailable("source marked as failing".to_string()));
        }
        Ok(inner.paths.clone())
    }
}
