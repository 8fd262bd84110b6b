use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// `[scheme://][user@]host(:|/)owner/name[.git][/]`
static GIT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.-]*://)?(?:[^@/]+@)?[^:/]+(?::\d+)?[:/](.+?)(?:\.git)?/?$")
        .expect("static git url pattern")
});

/// Human-readable name of a tracked repository.
///
/// Git URLs are reduced to their `owner/name` path; local paths (and anything
/// that does not parse as a URL) are returned unchanged.
pub fn repository_name(identity: &str) -> String {
    if is_local_path(identity) {
        return identity.to_string();
    }

    GIT_URL
        .captures(identity)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| identity.to_string())
}

/// Whether an identity names a directory on this machine rather than a remote
pub fn is_local_path(identity: &str) -> bool {
    !identity.contains("://") && Path::new(identity).is_dir()
}
