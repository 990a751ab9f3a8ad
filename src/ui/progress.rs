//! Progress reporting

use crate::executor::SyncEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Spinner fed by executor events
pub struct ProgressReporter {
    bar: ProgressBar,
    copied: AtomicUsize,
    removed: AtomicUsize,
    failed: AtomicUsize,
}

impl ProgressReporter {
    /// Create a spinner drawing to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        Self::with_bar(bar)
    }

    /// Create a reporter that renders nothing (quiet mode, tests)
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            copied: AtomicUsize::new(0),
            removed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Update the spinner from one executor event.
    pub fn handle(&self, event: &SyncEvent) {
        match event {
            SyncEvent::Started {
                source,
                destination,
            } => {
                self.copied.store(0, Ordering::Relaxed);
                self.removed.store(0, Ordering::Relaxed);
                self.failed.store(0, Ordering::Relaxed);
                self.bar.set_message(format!(
                    "Syncing {} → {}",
                    source.display(),
                    destination.display()
                ));
            }
            SyncEvent::Copied { path, updated } => {
                self.copied.fetch_add(1, Ordering::Relaxed);
                let action = if *updated { "Update" } else { "Copy" };
                self.set_current(action, path);
            }
            SyncEvent::Removed { path } => {
                self.removed.fetch_add(1, Ordering::Relaxed);
                self.set_current("Delete", path);
            }
            SyncEvent::Failed { action, path } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.bar
                    .println(format!("ERROR {} {}", action, path.display()));
            }
            SyncEvent::Finished { source, stats } => {
                self.bar
                    .println(format!("{}: {}", source.display(), stats));
            }
        }
    }

    fn set_current(&self, action: &str, path: &Path) {
        self.bar.set_message(format!(
            "{} {} | {} copied, {} removed",
            action,
            path.display(),
            self.copied.load(Ordering::Relaxed),
            self.removed.load(Ordering::Relaxed)
        ));
    }

    /// Failures seen since the last `Started` event
    pub fn failures(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    /// Clear the spinner line
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SyncStats;
    use std::path::PathBuf;

    fn started() -> SyncEvent {
        SyncEvent::Started {
            source: PathBuf::from("/src"),
            destination: PathBuf::from("/dst"),
        }
    }

    #[test]
    fn test_current_file_indicator_updates_message() {
        let reporter = ProgressReporter::hidden();
        reporter.handle(&started());
        reporter.handle(&SyncEvent::Copied {
            path: PathBuf::from("a/b/file.txt"),
            updated: false,
        });

        let msg = reporter.bar.message();
        assert!(msg.contains("Copy"));
        assert!(msg.contains("a/b/file.txt"));
        assert!(msg.contains("1 copied"));
    }

    #[test]
    fn test_counters_reset_per_replication() {
        let reporter = ProgressReporter::hidden();
        reporter.handle(&started());
        reporter.handle(&SyncEvent::Failed {
            action: "Copy",
            path: PathBuf::from("x"),
        });
        assert_eq!(reporter.failures(), 1);

        reporter.handle(&started());
        assert_eq!(reporter.failures(), 0);
    }

    #[test]
    fn test_finish_executes_without_panicking() {
        let reporter = ProgressReporter::hidden();
        reporter.handle(&started());
        reporter.handle(&SyncEvent::Finished {
            source: PathBuf::from("/src"),
            stats: SyncStats::default(),
        });
        reporter.finish();
    }
}
