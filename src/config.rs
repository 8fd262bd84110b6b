//! Tracker configuration file
//!
//! ```toml
//! root = "/var/lib/repowarden"
//! storage = "sqlite"
//! output_hook = "/usr/local/bin/page-security"
//!
//! [[repos]]
//! repo = "git@github.com:acme/api.git"
//! baseline_filename = ".secrets.baseline"
//! [repos.plugins]
//! hex_limit = 3.0
//! PrivateKeyDetector = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hooks::{HookError, OutputHook, build_hook};
use crate::model::{ConfigDecodeError, PluginConfig, PluginsCompact, RepoSettings};
use crate::repository::{CycleOptions, Database, FileStore, Store, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where tracking records are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per repository under `<root>/tracked/`
    #[default]
    File,
    /// `<root>/tracked.db`
    Sqlite,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfig {
    /// Working copies and records live here
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub storage: StorageBackend,
    /// `"stdout"` (the default) or a script to run on findings
    #[serde(default)]
    pub output_hook: Option<String>,
    /// File whose contents are passed to the output hook script
    #[serde(default)]
    pub output_config: Option<PathBuf>,
    /// Keep advancing the checkpoint past commits that had findings
    #[serde(default)]
    pub always_update: bool,
    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

/// A repository to track
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub repo: String,
    /// Start from this commit instead of the current head
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub baseline_filename: Option<String>,
    #[serde(default)]
    pub exclude_regex: Option<String>,
    #[serde(default)]
    pub cron: String,
    /// Compact plugin table; absent means every plugin with default limits
    #[serde(default)]
    pub plugins: Option<PluginsCompact>,
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Configured root, or `<cache dir>/repowarden`
    pub fn root_dir(&self) -> PathBuf {
        self.root
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("repowarden")))
            .unwrap_or_else(|| PathBuf::from(".repowarden"))
    }

    pub fn output_hook(&self) -> Result<Box<dyn OutputHook>, HookError> {
        build_hook(self.output_hook.as_deref(), self.output_config.as_deref())
    }

    pub fn cycle_options(&self, dry_run: bool) -> CycleOptions {
        CycleOptions {
            dry_run,
            always_update: self.always_update,
        }
    }

    pub async fn open_store(&self) -> Result<Store, StoreError> {
        let root = self.root_dir();
        match self.storage {
            StorageBackend::File => Ok(Store::File(FileStore::open(&root).await?)),
            StorageBackend::Sqlite => Ok(Store::Sqlite(Database::open(&root).await?)),
        }
    }
}

impl RepoEntry {
    pub fn to_settings(&self) -> Result<RepoSettings, ConfigDecodeError> {
        let plugins = match &self.plugins {
            Some(compact) => PluginConfig::decode(compact)?,
            None => PluginConfig::default(),
        };

        let mut settings = RepoSettings::new(&self.repo)
            .with_plugins(plugins)
            .with_cron(&self.cron);
        if let Some(sha) = &self.sha {
            settings = settings.with_last_commit(sha);
        }
        if let Some(baseline) = &self.baseline_filename {
            settings = settings.with_baseline(baseline);
        }
        if let Some(exclude) = &self.exclude_regex {
            settings = settings.with_exclude(exclude);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PluginKind;

    const SAMPLE: &str = r#"
root = "/srv/warden"
storage = "sqlite"

[[repos]]
repo = "git@github.com:acme/api.git"
baseline_filename = ".secrets.baseline"
exclude_regex = "^vendor/"
cron = "0 * * * *"
[repos.plugins]
hex_limit = 2.5
PrivateKeyDetector = true

[[repos]]
repo = "https://github.com/acme/web"
sha = "abc123"
"#;

    #[test]
    fn test_parse_sample() {
        let config = TrackerConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.root_dir(), PathBuf::from("/srv/warden"));
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.repos.len(), 2);
    }

    #[test]
    fn test_entry_with_plugins() {
        let config = TrackerConfig::from_toml_str(SAMPLE).unwrap();
        let settings = config.repos[0].to_settings().unwrap();

        assert_eq!(settings.identity, "git@github.com:acme/api.git");
        assert_eq!(settings.baseline_filename.as_deref(), Some(".secrets.baseline"));
        assert_eq!(settings.exclude_regex.as_deref(), Some("^vendor/"));
        assert_eq!(settings.cron, "0 * * * *");
        assert_eq!(settings.plugins.limit(PluginKind::HexHighEntropyString), Some(2.5));
        assert!(settings.plugins.is_enabled(PluginKind::PrivateKeyDetector));
        assert!(!settings.plugins.is_enabled(PluginKind::AwsKeyDetector));
    }

    #[test]
    fn test_entry_defaults() {
        let config = TrackerConfig::from_toml_str(SAMPLE).unwrap();
        let settings = config.repos[1].to_settings().unwrap();

        assert_eq!(settings.last_commit, "abc123");
        assert_eq!(settings.plugins, PluginConfig::default());
        assert_eq!(settings.baseline_filename, None);
        assert_eq!(settings.cron, "");
    }

    #[test]
    fn test_empty_config() {
        let config = TrackerConfig::from_toml_str("").unwrap();
        assert_eq!(config.storage, StorageBackend::File);
        assert!(config.repos.is_empty());
        assert!(config.root_dir().ends_with("repowarden") || config.root_dir().ends_with(".repowarden"));
    }

    #[test]
    fn test_bad_plugin_is_rejected() {
        let config = TrackerConfig::from_toml_str(
            "[[repos]]\nrepo = \"x\"\n[repos.plugins]\nNopeDetector = true\n",
        )
        .unwrap();
        assert!(matches!(
            config.repos[0].to_settings(),
            Err(ConfigDecodeError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn test_output_hook_settings() {
        let config = TrackerConfig::from_toml_str("always_update = true\n").unwrap();
        assert!(config.output_hook().is_ok());
        assert_eq!(
            config.cycle_options(false),
            CycleOptions {
                dry_run: false,
                always_update: true,
            }
        );

        let config = TrackerConfig::from_toml_str("output_hook = \"pagerduty\"\n").unwrap();
        assert!(!config.always_update);
        assert!(matches!(config.output_hook(), Err(HookError::Unknown(_))));
    }

    #[test]
    fn test_unknown_storage_fails() {
        assert!(matches!(
            TrackerConfig::from_toml_str("storage = \"redis\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = TrackerConfig::load(Path::new("/nonexistent/repowarden.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
