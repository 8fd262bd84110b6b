//! Tracking record of one repository, in memory and at rest
//!
//! `RepoSettings` is what a [`TrackedRepo`] works with. `StoredRecord` is the
//! exact field set written by a record store. They differ only in the plugin
//! configuration, which crosses [`PluginConfig::encode`] / [`PluginConfig::decode`].
//!
//! [`TrackedRepo`]: crate::repository::TrackedRepo

use serde::{Deserialize, Serialize};

use super::plugins::{ConfigDecodeError, PluginConfig, PluginsCompact};

/// In-memory tracking record (everything but the working-copy handle)
#[derive(Debug, Clone, PartialEq)]
pub struct RepoSettings {
    /// Git URL or local path; never changes once tracked
    pub identity: String,
    /// Checkpoint: last commit scanned up to
    pub last_commit: String,
    pub plugins: PluginConfig,
    pub baseline_filename: Option<String>,
    pub exclude_regex: Option<String>,
    /// Opaque scheduling expression, passed through untouched
    pub cron: String,
}

impl RepoSettings {
    /// Settings with the default plugin set and no checkpoint yet
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            last_commit: String::new(),
            plugins: PluginConfig::default(),
            baseline_filename: None,
            exclude_regex: None,
            cron: String::new(),
        }
    }

    pub fn with_last_commit(mut self, sha: impl Into<String>) -> Self {
        self.last_commit = sha.into();
        self
    }

    pub fn with_plugins(mut self, plugins: PluginConfig) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_baseline(mut self, filename: impl Into<String>) -> Self {
        self.baseline_filename = non_empty(Some(filename.into()));
        self
    }

    pub fn with_exclude(mut self, regex: impl Into<String>) -> Self {
        self.exclude_regex = non_empty(Some(regex.into()));
        self
    }

    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = cron.into();
        self
    }

    pub fn to_stored(&self) -> StoredRecord {
        StoredRecord {
            repo: self.identity.clone(),
            sha: self.last_commit.clone(),
            plugins: self.plugins.encode(),
            cron: self.cron.clone(),
            baseline_filename: self.baseline_filename.clone(),
            exclude_regex: self.exclude_regex.clone(),
        }
    }
}

/// Persisted tracking record
///
/// Field names match tracked files written by earlier deployments, so they
/// stay as they are even where the Rust side uses longer names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub repo: String,
    pub sha: String,
    pub plugins: PluginsCompact,
    #[serde(default)]
    pub cron: String,
    #[serde(default)]
    pub baseline_filename: Option<String>,
    #[serde(default)]
    pub exclude_regex: Option<String>,
}

impl StoredRecord {
    pub fn into_settings(self) -> Result<RepoSettings, ConfigDecodeError> {
        Ok(RepoSettings {
            plugins: PluginConfig::decode(&self.plugins)?,
            identity: self.repo,
            last_commit: self.sha,
            baseline_filename: non_empty(self.baseline_filename),
            exclude_regex: non_empty(self.exclude_regex),
            cron: self.cron,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PluginKind;
    use serde_json::json;

    #[test]
    fn test_stored_record_has_exactly_the_persisted_fields() {
        let settings = RepoSettings::new("git@github.com:acme/api.git")
            .with_last_commit("c1")
            .with_plugins(PluginConfig::empty())
            .with_baseline(".secrets.baseline")
            .with_cron("0 * * * *");

        let value = serde_json::to_value(settings.to_stored()).unwrap();
        assert_eq!(
            value,
            json!({
                "repo": "git@github.com:acme/api.git",
                "sha": "c1",
                "plugins": {},
                "cron": "0 * * * *",
                "baseline_filename": ".secrets.baseline",
                "exclude_regex": null,
            })
        );
    }

    #[test]
    fn test_settings_round_trip_through_stored_form() {
        let mut plugins = PluginConfig::empty();
        plugins.set_limit(PluginKind::HexHighEntropyString, 2.5).unwrap();
        let settings = RepoSettings::new("/srv/repos/app")
            .with_last_commit("0123abcd")
            .with_plugins(plugins)
            .with_exclude("^tests/");

        let json = serde_json::to_string(&settings.to_stored()).unwrap();
        let stored: StoredRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(stored.into_settings().unwrap(), settings);
    }

    #[test]
    fn test_empty_strings_load_as_absent() {
        let stored: StoredRecord = serde_json::from_value(json!({
            "repo": "repoA",
            "sha": "c1",
            "plugins": {"AwsKeyDetector": true},
            "cron": "",
            "baseline_filename": "",
            "exclude_regex": "",
        }))
        .unwrap();

        let settings = stored.into_settings().unwrap();
        assert_eq!(settings.baseline_filename, None);
        assert_eq!(settings.exclude_regex, None);
        assert!(settings.plugins.is_enabled(PluginKind::AwsKeyDetector));
    }

    #[test]
    fn test_record_without_plugins_is_rejected() {
        let result = serde_json::from_value::<StoredRecord>(json!({
            "repo": "repoA",
            "sha": "c1",
        }));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("plugins"), "{err}");
    }

    #[test]
    fn test_malformed_plugins_fail_to_load() {
        let stored: StoredRecord = serde_json::from_value(json!({
            "repo": "repoA",
            "sha": "c1",
            "plugins": {"hex_limit": "three"},
        }))
        .unwrap();

        assert!(matches!(
            stored.into_settings(),
            Err(ConfigDecodeError::InvalidValue { .. })
        ));
    }
}
