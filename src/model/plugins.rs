//! Plugin configuration for the scan engine
//!
//! `PluginConfig` is the in-memory form handed to a [`ScanEngine`]. It is
//! persisted as a [`PluginsCompact`] JSON object, and the two only meet in
//! [`PluginConfig::encode`] / [`PluginConfig::decode`].
//!
//! [`ScanEngine`]: crate::scanner::ScanEngine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default Shannon entropy limit for hex strings
pub const DEFAULT_HEX_LIMIT: f64 = 3.0;

/// Default Shannon entropy limit for base64 strings
pub const DEFAULT_BASE64_LIMIT: f64 = 4.5;

/// Entropy is measured in bits per character; nothing scores above 8.
const MAX_LIMIT: f64 = 8.0;

/// Errors raised while decoding a compact plugin configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigDecodeError {
    #[error("unknown plugin setting `{0}`")]
    UnknownPlugin(String),

    #[error("`{key}` must be {expected}, found `{found}`")]
    InvalidValue {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("`{key}` limit {limit} is outside (0, 8]")]
    LimitOutOfRange { key: String, limit: f64 },

    #[error("{kind} does not take an entropy limit")]
    NoLimit { kind: PluginKind },
}

/// A detection plugin known to the scan engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluginKind {
    HexHighEntropyString,
    Base64HighEntropyString,
    PrivateKeyDetector,
    AwsKeyDetector,
    BasicAuthDetector,
    KeywordDetector,
}

impl PluginKind {
    pub const ALL: [PluginKind; 6] = [
        PluginKind::HexHighEntropyString,
        PluginKind::Base64HighEntropyString,
        PluginKind::PrivateKeyDetector,
        PluginKind::AwsKeyDetector,
        PluginKind::BasicAuthDetector,
        PluginKind::KeywordDetector,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PluginKind::HexHighEntropyString => "HexHighEntropyString",
            PluginKind::Base64HighEntropyString => "Base64HighEntropyString",
            PluginKind::PrivateKeyDetector => "PrivateKeyDetector",
            PluginKind::AwsKeyDetector => "AwsKeyDetector",
            PluginKind::BasicAuthDetector => "BasicAuthDetector",
            PluginKind::KeywordDetector => "KeywordDetector",
        }
    }

    /// Compact key for plugins parameterised by an entropy limit
    fn limit_key(self) -> Option<&'static str> {
        match self {
            PluginKind::HexHighEntropyString => Some("hex_limit"),
            PluginKind::Base64HighEntropyString => Some("base64_limit"),
            _ => None,
        }
    }

    pub fn default_limit(self) -> Option<f64> {
        match self {
            PluginKind::HexHighEntropyString => Some(DEFAULT_HEX_LIMIT),
            PluginKind::Base64HighEntropyString => Some(DEFAULT_BASE64_LIMIT),
            _ => None,
        }
    }

    fn compact_key(self) -> &'static str {
        self.limit_key().unwrap_or_else(|| self.name())
    }

    fn from_compact_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.compact_key() == key)
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compact, storage-ready plugin configuration
///
/// Entropy plugins are stored by their limit (`"hex_limit": 3.0`), flag
/// plugins as `"PrivateKeyDetector": true`. Disabled plugins are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginsCompact(pub Map<String, Value>);

/// In-memory plugin configuration: the set of active plugins and their limits
///
/// Entropy plugins always carry a limit and flag plugins never do; the
/// mutators keep that true, which is what makes the codec lossless.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginConfig {
    plugins: BTreeMap<PluginKind, Option<f64>>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        let mut config = Self::empty();
        for kind in PluginKind::ALL {
            config.enable(kind);
        }
        config
    }
}

impl PluginConfig {
    /// A configuration with every plugin disabled
    pub fn empty() -> Self {
        Self {
            plugins: BTreeMap::new(),
        }
    }

    /// Enable a plugin, using its default limit if it takes one
    pub fn enable(&mut self, kind: PluginKind) {
        self.plugins.insert(kind, kind.default_limit());
    }

    pub fn disable(&mut self, kind: PluginKind) {
        self.plugins.remove(&kind);
    }

    /// Enable an entropy plugin with a specific limit
    pub fn set_limit(&mut self, kind: PluginKind, limit: f64) -> Result<(), ConfigDecodeError> {
        let key = kind.limit_key().ok_or(ConfigDecodeError::NoLimit { kind })?;
        check_limit(key, limit)?;
        self.plugins.insert(kind, Some(limit));
        Ok(())
    }

    pub fn is_enabled(&self, kind: PluginKind) -> bool {
        self.plugins.contains_key(&kind)
    }

    /// Entropy limit of an enabled entropy plugin
    pub fn limit(&self, kind: PluginKind) -> Option<f64> {
        self.plugins.get(&kind).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Enabled plugins in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (PluginKind, Option<f64>)> + '_ {
        self.plugins.iter().map(|(kind, limit)| (*kind, *limit))
    }

    pub fn encode(&self) -> PluginsCompact {
        let mut map = Map::new();
        for (kind, limit) in self.iter() {
            let value = match limit {
                Some(limit) => Value::from(limit),
                None => Value::Bool(true),
            };
            map.insert(kind.compact_key().to_string(), value);
        }
        PluginsCompact(map)
    }

    pub fn decode(compact: &PluginsCompact) -> Result<Self, ConfigDecodeError> {
        let mut config = Self::empty();

        for (key, value) in &compact.0 {
            let kind = PluginKind::from_compact_key(key)
                .ok_or_else(|| ConfigDecodeError::UnknownPlugin(key.clone()))?;

            // `false` is accepted as an explicit "disabled"
            if value == &Value::Bool(false) {
                continue;
            }

            if kind.limit_key().is_some() {
                let limit = value.as_f64().ok_or_else(|| ConfigDecodeError::InvalidValue {
                    key: key.clone(),
                    expected: "a number",
                    found: value.to_string(),
                })?;
                config.set_limit(kind, limit)?;
            } else if value == &Value::Bool(true) {
                config.enable(kind);
            } else {
                return Err(ConfigDecodeError::InvalidValue {
                    key: key.clone(),
                    expected: "a boolean",
                    found: value.to_string(),
                });
            }
        }

        Ok(config)
    }
}

fn check_limit(key: &str, limit: f64) -> Result<(), ConfigDecodeError> {
    if limit.is_finite() && limit > 0.0 && limit <= MAX_LIMIT {
        Ok(())
    } else {
        Err(ConfigDecodeError::LimitOutOfRange {
            key: key.to_string(),
            limit,
        })
    }
}
