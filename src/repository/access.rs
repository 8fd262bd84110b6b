//! Repository access trait
//!
//! Everything a tracked repository needs from version control, so the
//! tracking logic never talks to git directly.

use std::path::Path;
use thiserror::Error;

/// Errors raised while accessing a repository
#[derive(Debug, Error)]
pub enum AccessError {
    /// Working-copy initialisation failed
    #[error("failed to set up a working copy for {identity}: {source}")]
    Setup {
        identity: String,
        #[source]
        source: std::io::Error,
    },

    /// Clone or fetch from the remote failed
    #[error("failed to sync {name} with its remote: {source}")]
    Sync {
        name: String,
        #[source]
        source: git2::Error,
    },

    /// The commit cannot be diffed against, e.g. after a history rewrite
    #[error("commit `{commit}` is not reachable")]
    UnreachableCommit { commit: String },

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Version-control operations for one repository
pub trait RepoAccess: Sized {
    /// Prepare local tracking state for `identity` under `root`
    fn setup(identity: &str, root: &Path) -> Result<Self, AccessError>;

    /// Bring the local copy up to date with the primary branch
    fn sync_to_head(&self) -> Result<(), AccessError>;

    /// Unified diff from `commit` to the current head
    fn diff_since(&self, commit: &str) -> Result<String, AccessError>;

    fn current_head_commit(&self) -> Result<String, AccessError>;

    /// Content of `filename` at the current head, `None` if it does not exist
    fn read_file_at_head(&self, filename: &str) -> Result<Option<String>, AccessError>;

    /// Human-readable repository name
    fn display_name(&self) -> String;
}
