//! Clone/fetch progress reporting
//!
//! Keeps indicatif out of the git access code; scheduled runs use the no-op
//! reporter.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

/// Snapshot of a running git transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub received_objects: u64,
    pub indexed_objects: u64,
    pub total_objects: u64,
    pub received_bytes: u64,
}

impl TransferStats {
    pub fn from_git(stats: &git2::Progress<'_>) -> Self {
        Self {
            received_objects: stats.received_objects() as u64,
            indexed_objects: stats.indexed_objects() as u64,
            total_objects: stats.total_objects() as u64,
            received_bytes: stats.received_bytes() as u64,
        }
    }
}

/// A transfer being reported
pub trait ProgressHandle: Send + Sync {
    fn update(&self, stats: TransferStats);
    fn finish(&self);
}

/// Factory for progress handles, one per transfer
pub trait ProgressReporter: Send + Sync {
    fn start(&self, label: &str) -> Box<dyn ProgressHandle>;
}

/// Progress bars on the terminal
pub struct IndicatifProgress;

impl ProgressReporter for IndicatifProgress {
    fn start(&self, label: &str) -> Box<dyn ProgressHandle> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(&format!(
                    "{{spinner:.green}} {}: [{{bar:40.cyan/blue}}] {{pos}}/{{len}} objects {{msg}}",
                    label
                ))
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Box::new(IndicatifHandle(pb))
    }
}

struct IndicatifHandle(ProgressBar);

impl ProgressHandle for IndicatifHandle {
    fn update(&self, stats: TransferStats) {
        self.0.set_length(stats.total_objects);
        self.0.set_position(stats.received_objects);
        self.0.set_message(HumanBytes(stats.received_bytes).to_string());
    }

    fn finish(&self) {
        self.0.finish_and_clear();
    }
}

/// Reports nothing
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn start(&self, _label: &str) -> Box<dyn ProgressHandle> {
        Box::new(NoopHandle)
    }
}

struct NoopHandle;

impl ProgressHandle for NoopHandle {
    fn update(&self, _stats: TransferStats) {}
    fn finish(&self) {}
}

/// Terminal progress when `verbose`, nothing otherwise
pub fn reporter_for(verbose: bool) -> Box<dyn ProgressReporter> {
    if verbose {
        Box::new(IndicatifProgress)
    } else {
        Box::new(NoopProgress)
    }
}
