//! Versioned-source port and its implementations.

mod git;
mod memory;

pub use git::GitSource;
pub use memory::MemorySource;

use crate::error::VcsError;

/// Anything that can report a current revision and the paths changed since
/// an earlier one.
pub trait VersionedSource: Send + Sync {
    /// The current revision marker, or `None` when the source has no
    /// revisions yet.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] when the source cannot be read.
    fn current_marker(&self) -> Result<Option<String>, VcsError>;

    /// Paths changed between `since` and the current revision.
    ///
    /// With `since = None`, or a marker the source no longer knows, the
    /// current revision is compared with its immediate predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError`] when the source cannot be read.
    fn paths_changed(&self, since: Option<&str>) -> Result<Vec<String>, VcsError>;
}
