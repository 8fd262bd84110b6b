mod finding;
mod plugins;
mod record;

pub use finding::{Finding, FindingKey, Findings};
pub use plugins::{
    ConfigDecodeError, DEFAULT_BASE64_LIMIT, DEFAULT_HEX_LIMIT, PluginConfig, PluginKind,
    PluginsCompact,
};
pub use record::{RepoSettings, StoredRecord};
