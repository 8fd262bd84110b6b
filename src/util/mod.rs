mod format;
mod path;

pub use format::short_commit;
pub use path::{is_local_path, repository_name};
