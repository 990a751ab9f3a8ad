//! Per-run statistics and status reports

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;

/// Outcome counters of a single sync run.
///
/// Produced fresh for every run; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Files written to the destination (new or updated)
    pub copied: usize,
    /// Files left untouched (identical or excluded)
    pub skipped: usize,
    /// Orphaned destination files and directories deleted
    pub removed: usize,
    /// Per-file and per-directory failures
    pub errors: usize,
}

impl SyncStats {
    /// Whether the run finished without any per-entry failure
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

impl AddAssign for SyncStats {
    fn add_assign(&mut self, rhs: Self) {
        self.copied += rhs.copied;
        self.skipped += rhs.skipped;
        self.removed += rhs.removed;
        self.errors += rhs.errors;
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Copied: {}, Skipped: {}, Removed: {}, Errors: {}",
            self.copied, self.skipped, self.removed, self.errors
        )
    }
}

/// Lightweight, hash-free view of a replication's state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub last_sync: Option<DateTime<Utc>>,
    pub source_files: usize,
    pub dest_files: usize,
    /// Rough signal: `max(0, source_files - dest_files)`
    pub pending_changes: usize,
    pub errors: usize,
}
