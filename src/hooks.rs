//! Alerting on new findings
//!
//! A run cycle hands every non-empty result to an [`OutputHook`]. The payload
//! is the same JSON document for every hook:
//!
//! ```json
//! {"repo": "api", "secrets": [{"type": "AWS Access Key", "filename": "...", ...}]}
//! ```

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

use crate::model::{Finding, Findings};

/// Name that selects [`StdoutHook`] in configuration
pub const STDOUT_HOOK: &str = "stdout";

#[derive(Debug, Error)]
pub enum HookError {
    #[error("unknown output hook: {0}")]
    Unknown(String),

    #[error("output hook script not found: {}", .0.display())]
    MissingScript(PathBuf),

    #[error("failed to read hook config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {}: {source}", script.display())]
    Spawn {
        script: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} exited with {status}: {stderr}", script.display())]
    Failed {
        script: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("failed to write alert: {0}")]
    Write(#[from] io::Error),

    #[error("failed to encode alert: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives the findings of a scan that found something
pub trait OutputHook {
    fn alert(&mut self, repo_name: &str, findings: &Findings) -> Result<(), HookError>;
}

#[derive(Serialize)]
struct Alert<'a> {
    repo: &'a str,
    secrets: Vec<&'a Finding>,
}

/// Alert payload handed to every hook
pub fn alert_json(repo_name: &str, findings: &Findings) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Alert {
        repo: repo_name,
        secrets: findings.iter().collect(),
    })
}

/// Writes one JSON alert per line
#[derive(Debug)]
pub struct JsonHook<W: Write> {
    out: W,
}

/// The default hook
pub type StdoutHook = JsonHook<io::Stdout>;

impl JsonHook<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonHook<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputHook for JsonHook<W> {
    fn alert(&mut self, repo_name: &str, findings: &Findings) -> Result<(), HookError> {
        let payload = alert_json(repo_name, findings)?;
        writeln!(self.out, "{payload}")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Runs a script as `<script> <repo name> <alert json> [config]`
#[derive(Debug, Clone)]
pub struct ExternalHook {
    script: PathBuf,
    config: Option<String>,
}

impl ExternalHook {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            config: None,
        }
    }

    /// Pass the contents of a hook config file as the last argument
    pub fn with_config(mut self, config: impl Into<String>) -> Self {
        self.config = Some(config.into());
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }
}

impl OutputHook for ExternalHook {
    fn alert(&mut self, repo_name: &str, findings: &Findings) -> Result<(), HookError> {
        let payload = alert_json(repo_name, findings)?;

        let mut command = Command::new(&self.script);
        command.arg(repo_name).arg(payload);
        if let Some(config) = &self.config {
            command.arg(config);
        }

        debug!(script = %self.script.display(), repo = repo_name, "Running output hook");
        let output = command.output().map_err(|source| HookError::Spawn {
            script: self.script.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(HookError::Failed {
                script: self.script.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve a configured hook
///
/// `None` and `"stdout"` give [`StdoutHook`]; anything else must be an
/// existing script. The contents of `config` are read now and handed to the
/// script on every alert.
pub fn build_hook(
    name: Option<&str>,
    config: Option<&Path>,
) -> Result<Box<dyn OutputHook>, HookError> {
    let name = match name {
        None | Some(STDOUT_HOOK) => return Ok(Box::new(StdoutHook::stdout())),
        Some(name) => name,
    };

    let script = PathBuf::from(name);
    if !script.is_file() {
        return Err(if name.contains(['/', std::path::MAIN_SEPARATOR]) {
            HookError::MissingScript(script)
        } else {
            HookError::Unknown(name.to_string())
        });
    }

    let mut hook = ExternalHook::new(script);
    if let Some(path) = config {
        let contents = std::fs::read_to_string(path).map_err(|source| HookError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        hook = hook.with_config(contents);
    }
    Ok(Box::new(hook))
}
