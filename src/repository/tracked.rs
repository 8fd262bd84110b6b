//! Lifecycle of one tracked repository
//!
//! A [`TrackedRepo`] pairs the tracking record with the working copy it is
//! scanned through. The checkpoint (`last_commit`) only moves forward through
//! [`TrackedRepo::update`], except when the stored checkpoint can no longer be
//! diffed against; a scan then resyncs it to head and reports nothing.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::TrackError;
use crate::hooks::OutputHook;
use crate::model::{Findings, PluginConfig, RepoSettings};
use crate::scanner::{Provenance, ScanEngine};
use crate::util::{repository_name, short_commit};

use super::access::{AccessError, RepoAccess};
use super::file_store::FileStore;
use super::git_checkout::GitCheckout;
use super::prompt::{OverrideLevel, OverridePrompt, StdioPrompt};
use super::store::RecordStore;

/// A tracked repository with its (optional) working copy
#[derive(Debug)]
pub struct TrackedRepo<A: RepoAccess = GitCheckout> {
    settings: RepoSettings,
    access: Option<A>,
}

/// Tracked repository backed by git2
pub type GitTrackedRepo = TrackedRepo<GitCheckout>;

/// How [`TrackedRepo::run_cycle`] treats the checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOptions {
    /// Scan and alert only; nothing is advanced or stored
    pub dry_run: bool,
    /// Advance past commits that had findings
    pub always_update: bool,
}

impl<A: RepoAccess> TrackedRepo<A> {
    /// Build from settings, setting up the working copy when `root` is given
    pub fn new(settings: RepoSettings, root: Option<&Path>) -> Result<Self, TrackError> {
        let access = root
            .map(|root| A::setup(&settings.identity, root))
            .transpose()?;
        Ok(Self { settings, access })
    }

    /// Build around an already prepared working copy
    pub fn with_access(settings: RepoSettings, access: A) -> Self {
        Self {
            settings,
            access: Some(access),
        }
    }

    /// Start tracking a repository
    ///
    /// Syncs the working copy, and when no checkpoint was supplied starts
    /// from the current head so only later commits get scanned.
    pub fn initialize(settings: RepoSettings, root: &Path) -> Result<Self, TrackError> {
        let mut repo = Self::new(settings, Some(root))?;
        repo.access()?.sync_to_head()?;

        if repo.settings.last_commit.is_empty() {
            repo.update()?;
        }

        info!(
            repo = %repo.display_name(),
            commit = short_commit(&repo.settings.last_commit),
            "Initialized tracked repository"
        );
        Ok(repo)
    }

    /// Load the stored record for `identity` and set up its working copy
    pub async fn load<S: RecordStore>(
        store: &S,
        identity: &str,
        root: &Path,
    ) -> Result<Self, TrackError> {
        let key = store.key_for(identity);
        let record = store
            .get(&key)
            .await?
            .ok_or_else(|| TrackError::RecordNotFound {
                identity: identity.to_string(),
            })?;

        let settings = record.into_settings()?;
        debug!(
            repo = identity,
            commit = short_commit(&settings.last_commit),
            "Loaded tracking record"
        );
        Self::new(settings, Some(root))
    }

    /// Load from the file store kept under `root`
    pub async fn load_from_root(identity: &str, root: &Path) -> Result<Self, TrackError> {
        let store = FileStore::open(root).await?;
        Self::load(&store, identity, root).await
    }

    /// Persist the record, prompting on the terminal if `level` asks to
    ///
    /// Returns `false` when an existing record was left in place.
    pub async fn save<S: RecordStore>(
        &self,
        store: &S,
        level: OverrideLevel,
    ) -> Result<bool, TrackError> {
        self.save_with(store, level, &mut StdioPrompt).await
    }

    /// Persist the record, asking `prompt` before replacing an existing one
    pub async fn save_with<S, P>(
        &self,
        store: &S,
        level: OverrideLevel,
        prompt: &mut P,
    ) -> Result<bool, TrackError>
    where
        S: RecordStore,
        P: OverridePrompt + ?Sized,
    {
        let key = store.key_for(&self.settings.identity);

        if store.exists(&key).await? {
            let replace = match level {
                OverrideLevel::Never => false,
                OverrideLevel::Always => true,
                OverrideLevel::AskUser => prompt
                    .confirm_override(&self.display_name())
                    .map_err(TrackError::Prompt)?,
            };
            if !replace {
                info!(repo = %self.display_name(), "Already tracked, record left unchanged");
                return Ok(false);
            }
        }

        store.put(&key, &self.settings.to_stored()).await?;
        debug!(
            repo = %self.display_name(),
            commit = short_commit(&self.settings.last_commit),
            "Saved tracking record"
        );
        Ok(true)
    }

    /// Secrets added since the checkpoint, minus those accepted in the baseline
    ///
    /// Does not move the checkpoint, except when the checkpoint is unreachable.
    pub fn scan<E: ScanEngine>(&mut self, engine: &E) -> Result<Findings, TrackError> {
        let (plugins, diff) = {
            let access = self.access()?;
            access.sync_to_head()?;
            let plugins = engine.init_plugins(&self.settings.plugins)?;
            (plugins, access.diff_since(&self.settings.last_commit))
        };

        let diff = match diff {
            Ok(diff) => diff,
            Err(AccessError::UnreachableCommit { commit }) => {
                self.resync_unreachable_checkpoint(&commit)?;
                return Ok(Findings::new());
            }
            Err(e) => return Err(e.into()),
        };

        let provenance = Provenance {
            baseline_filename: self.settings.baseline_filename.clone(),
            last_commit: self.settings.last_commit.clone(),
            repo: self.settings.identity.clone(),
        };
        let mut findings = engine.scan_diff(
            &plugins,
            &diff,
            self.settings.exclude_regex.as_deref(),
            &provenance,
        )?;

        if let Some(baseline_file) = self.settings.baseline_filename.as_deref() {
            let raw = self.access()?.read_file_at_head(baseline_file)?;
            if let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) {
                let baseline = engine.decode_baseline(&raw)?;
                findings = engine.difference(findings, &baseline);
            }
        }

        debug!(
            repo = %self.display_name(),
            since = short_commit(&self.settings.last_commit),
            count = findings.len(),
            "Scan finished"
        );
        Ok(findings)
    }

    /// Move the checkpoint to the current head
    pub fn update(&mut self) -> Result<(), TrackError> {
        let head = self.access()?.current_head_commit()?;
        if head != self.settings.last_commit {
            debug!(
                repo = %self.display_name(),
                from = short_commit(&self.settings.last_commit),
                to = short_commit(&head),
                "Advancing checkpoint"
            );
        }
        self.settings.last_commit = head;
        Ok(())
    }

    /// The checkpoint cannot be diffed against (rewritten history, pruned
    /// clone). Nothing is reported and scanning restarts from head.
    fn resync_unreachable_checkpoint(&mut self, commit: &str) -> Result<(), TrackError> {
        warn!(
            repo = %self.display_name(),
            commit = short_commit(commit),
            "Checkpoint is unreachable, resyncing to head"
        );
        self.update()
    }

    /// Scan, alert on findings, then move the checkpoint
    ///
    /// The checkpoint is advanced and stored only after a clean scan, so
    /// commits with findings are reported again on the next cycle until they
    /// are fixed or added to the baseline. `always_update` advances regardless.
    /// A failing hook leaves the checkpoint where it was.
    pub async fn run_cycle<S, E, H>(
        &mut self,
        store: &S,
        engine: &E,
        hook: &mut H,
        options: CycleOptions,
    ) -> Result<Findings, TrackError>
    where
        S: RecordStore,
        E: ScanEngine,
        H: OutputHook + ?Sized,
    {
        let findings = self.scan(engine)?;

        if findings.is_empty() {
            info!(repo = %self.display_name(), "No new secrets");
        } else {
            warn!(repo = %self.display_name(), count = findings.len(), "New secrets found");
            hook.alert(&self.display_name(), &findings)?;
        }

        if options.dry_run {
            return Ok(findings);
        }
        if findings.is_empty() || options.always_update {
            self.update()?;
            self.save(store, OverrideLevel::Always).await?;
        } else {
            debug!(
                repo = %self.display_name(),
                commit = short_commit(&self.settings.last_commit),
                "Keeping checkpoint until findings are resolved"
            );
        }
        Ok(findings)
    }

    pub fn access(&self) -> Result<&A, TrackError> {
        self.access.as_ref().ok_or_else(|| TrackError::NotInitialized {
            identity: self.settings.identity.clone(),
        })
    }

    pub fn access_mut(&mut self) -> Result<&mut A, TrackError> {
        match self.access.as_mut() {
            Some(access) => Ok(access),
            None => Err(TrackError::NotInitialized {
                identity: self.settings.identity.clone(),
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.access.is_some()
    }

    /// Human-readable name, e.g. `owner/name` for a git URL
    pub fn display_name(&self) -> String {
        match &self.access {
            Some(access) => access.display_name(),
            None => repository_name(&self.settings.identity),
        }
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    pub fn identity(&self) -> &str {
        &self.settings.identity
    }

    pub fn last_commit(&self) -> &str {
        &self.settings.last_commit
    }

    pub fn plugins(&self) -> &PluginConfig {
        &self.settings.plugins
    }

    pub fn baseline_filename(&self) -> Option<&str> {
        self.settings.baseline_filename.as_deref()
    }

    pub fn exclude_regex(&self) -> Option<&str> {
        self.settings.exclude_regex.as_deref()
    }

    pub fn cron(&self) -> &str {
        &self.settings.cron
    }
}
