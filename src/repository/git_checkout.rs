use git2::build::RepoBuilder;
use git2::{DiffFormat, ErrorCode, FetchOptions, RemoteCallbacks, Repository};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::util::{is_local_path, repository_name};

use super::access::{AccessError, RepoAccess};
use super::progress::{NoopProgress, ProgressReporter, TransferStats};
use super::store::hash_name;

/// Mirror every branch of the remote into the bare clone
const FETCH_REFSPEC: &str = "+refs/heads/*:refs/heads/*";

enum Location {
    /// Existing repository on this machine, used in place
    Local(PathBuf),
    /// Bare mirror of a remote, cloned on first sync
    Remote { url: String, clone_dir: PathBuf },
}

/// git2-backed repository access
pub struct GitCheckout {
    identity: String,
    location: Location,
    progress: Box<dyn ProgressReporter>,
}

impl fmt::Debug for GitCheckout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCheckout")
            .field("identity", &self.identity)
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

impl GitCheckout {
    /// Report clone/fetch progress through `progress`
    pub fn set_progress(&mut self, progress: Box<dyn ProgressReporter>) {
        self.progress = progress;
    }

    /// Where the repository lives on disk
    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Local(path) => path,
            Location::Remote { clone_dir, .. } => clone_dir,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.location, Location::Local(_))
    }

    fn open(&self) -> Result<Repository, AccessError> {
        let repo = match &self.location {
            Location::Local(path) => Repository::open(path)?,
            Location::Remote { clone_dir, .. } => Repository::open_bare(clone_dir)?,
        };
        Ok(repo)
    }

    fn sync_remote(&self, url: &str, clone_dir: &Path) -> Result<(), git2::Error> {
        let pb = self.progress.start(&self.display_name());

        let mut callbacks = RemoteCallbacks::new();
        callbacks.transfer_progress(|stats| {
            pb.update(TransferStats::from_git(&stats));
            true
        });
        let mut fetch = FetchOptions::new();
        fetch.remote_callbacks(callbacks);

        let result = if clone_dir.join("HEAD").exists() {
            debug!(path = %clone_dir.display(), "Fetching into existing clone");
            Repository::open_bare(clone_dir).and_then(|repo| {
                let mut remote = repo.find_remote("origin")?;
                remote.fetch(&[FETCH_REFSPEC], Some(&mut fetch), None)
            })
        } else {
            info!(url, path = %clone_dir.display(), "Cloning repository");
            RepoBuilder::new()
                .bare(true)
                .fetch_options(fetch)
                .clone(url, clone_dir)
                .map(|_| ())
        };

        pb.finish();
        result
    }
}

impl RepoAccess for GitCheckout {
    fn setup(identity: &str, root: &Path) -> Result<Self, AccessError> {
        let location = if is_local_path(identity) {
            Location::Local(PathBuf::from(identity))
        } else {
            let repos_dir = root.join("repos");
            std::fs::create_dir_all(&repos_dir).map_err(|source| AccessError::Setup {
                identity: identity.to_string(),
                source,
            })?;
            Location::Remote {
                url: identity.to_string(),
                clone_dir: repos_dir.join(hash_name(identity)),
            }
        };

        Ok(Self {
            identity: identity.to_string(),
            location,
            progress: Box::new(NoopProgress),
        })
    }

    fn sync_to_head(&self) -> Result<(), AccessError> {
        let result = match &self.location {
            // Local repositories are scanned as they are
            Location::Local(path) => Repository::open(path).map(|_| ()),
            Location::Remote { url, clone_dir } => self.sync_remote(url, clone_dir),
        };

        result.map_err(|source| AccessError::Sync {
            name: self.display_name(),
            source,
        })
    }

    fn diff_since(&self, commit: &str) -> Result<String, AccessError> {
        let repo = self.open()?;

        let old_tree = repo
            .revparse_single(commit)
            .and_then(|object| object.peel_to_tree())
            .map_err(|_| AccessError::UnreachableCommit {
                commit: commit.to_string(),
            })?;
        let head_tree = repo.head()?.peel_to_tree()?;

        let diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&head_tree), None)?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => patch.push(line.origin()),
                // End-of-file newline markers
                '=' | '>' | '<' => return true,
                _ => {}
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            if !patch.ends_with('\n') {
                patch.push('\n');
            }
            true
        })?;

        Ok(patch)
    }

    fn current_head_commit(&self) -> Result<String, AccessError> {
        let repo = self.open()?;
        let head = repo.head()?.peel_to_commit()?;
        Ok(head.id().to_string())
    }

    fn read_file_at_head(&self, filename: &str) -> Result<Option<String>, AccessError> {
        let repo = self.open()?;
        let tree = repo.head()?.peel_to_tree()?;

        let entry = match tree.get_path(Path::new(filename)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let blob = entry.to_object(&repo)?.peel_to_blob()?;

        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }

    fn display_name(&self) -> String {
        repository_name(&self.identity)
    }
}
