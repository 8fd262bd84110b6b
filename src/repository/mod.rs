mod access;
mod database;
mod file_store;
mod git_checkout;
mod progress;
mod prompt;
mod store;
mod tracked;

pub use access::{AccessError, RepoAccess};
pub use database::Database;
pub use file_store::FileStore;
pub use git_checkout::GitCheckout;
pub use progress::{
    IndicatifProgress, NoopProgress, ProgressHandle, ProgressReporter, TransferStats, reporter_for,
};
pub use prompt::{ConsolePrompt, OverrideLevel, OverridePrompt, StdioPrompt};
pub use store::{RecordStore, Store, StoreError, hash_name};
pub use tracked::{CycleOptions, GitTrackedRepo, TrackedRepo};

/// Version of the tracked record schema kept in the database metadata table
pub const SCHEMA_VERSION: &str = "1";
