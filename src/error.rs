use thiserror::Error;

use crate::hooks::HookError;
use crate::model::ConfigDecodeError;
use crate::repository::{AccessError, StoreError};
use crate::scanner::ScanError;

/// Errors returned by tracked repository operations
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("{identity} is not tracked")]
    RecordNotFound { identity: String },

    #[error("stored plugin configuration is invalid: {0}")]
    ConfigDecode(#[from] ConfigDecodeError),

    /// The record was built without a working copy
    #[error("{identity} has no working copy; construct it with a root path")]
    NotInitialized { identity: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("output hook failed: {0}")]
    Hook(#[from] HookError),

    #[error("override prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
}
