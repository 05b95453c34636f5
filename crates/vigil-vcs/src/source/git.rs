use std::path::{Path, PathBuf};

use tracing::debug;

use super::VersionedSource;
use crate::error::VcsError;

/// Git repository source. The marker is the HEAD commit id.
///
/// The repository is re-discovered on every call, so commits, resets and
/// force-pushes made by other processes are always visible.
#[derive(Debug, Clone)]
pub struct GitSource {
    path: PathBuf,
}

impl GitSource {
    /// Point at the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VcsError::NotGitRepo`] if no repository is found there.
    pub fn discover(path: &Path) -> Result<Self, VcsError> {
        gix::discover(path).map_err(|_| VcsError::NotGitRepo(path.to_path_buf()))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<gix::Repository, VcsError> {
        gix::discover(&self.path).map_err(|_| VcsError::NotGitRepo(self.path.clone()))
    }
}

fn git_err(e: impl std::fmt::Display) -> VcsError {
    VcsError::Git(e.to_string())
}

fn head_commit_id(repo: &gix::Repository) -> Result<Option<gix::ObjectId>, VcsError> {
    let head = repo.head().map_err(git_err)?;
    Ok(head.id().map(gix::Id::detach))
}

/// Look up `marker` as a commit; `None` if it no longer exists.
fn resolve_commit<'repo>(repo: &'repo gix::Repository, marker: &str) -> Option<gix::Commit<'repo>> {
    let oid: gix::ObjectId = marker.parse().ok()?;
    repo.find_commit(oid).ok()
}

impl VersionedSource for GitSource {
    fn current_marker(&self) -> Result<Option<String>, VcsError> {
        let repo = self.open()?;
        Ok(head_commit_id(&repo)?.map(|id| id.to_string()))
    }

    fn paths_changed(&self, since: Option<&str>) -> Result<Vec<String>, VcsError> {
        let repo = self.open()?;
        let Some(head_id) = head_commit_id(&repo)? else {
            return Ok(Vec::new());
        };
        let head = repo.find_commit(head_id).map_err(git_err)?;
        let new_tree = head.tree().map_err(git_err)?;

        let base = since.and_then(|marker| {
            let found = resolve_commit(&repo, marker);
            if found.is_none() {
                debug!(marker, "marker no longer resolves, diffing HEAD against its parent");
            }
            found
        });
        let old_tree = match base {
            Some(commit) => commit.tree().map_err(git_err)?,
            None => match head.parent_ids().next() {
                Some(parent) => repo
                    .find_commit(parent.detach())
                    .map_err(git_err)?
                    .tree()
                    .map_err(git_err)?,
                None => repo.empty_tree(),
            },
        };

        let changes = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
            .map_err(git_err)?;
        let mut paths: Vec<String> = changes
            .iter()
            .filter(|change| !change.entry_mode().is_tree())
            .map(|change| change.location().to_string())
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}
