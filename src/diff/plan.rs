//! Sync plan types

use crate::types::SyncAction;

/// Ordered list of actions for one replication plus aggregate counts.
///
/// Source-pass actions come in walk order, so every `CreateDir` precedes the
/// files that live in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncPlan {
    /// Actions to execute, in order
    pub actions: Vec<SyncAction>,

    /// Aggregate statistics about the plan
    pub stats: PlanStats,
}

impl SyncPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the plan and update statistics
    pub fn add_action(&mut self, action: SyncAction) {
        match &action {
            SyncAction::CreateDir(_) => self.stats.dir_count += 1,
            SyncAction::CopyNew(_) => self.stats.create_count += 1,
            SyncAction::Overwrite(_) => self.stats.update_count += 1,
            SyncAction::Skip(_) => self.stats.skip_count += 1,
            SyncAction::Delete(_) | SyncAction::DeleteDir(_) => self.stats.delete_count += 1,
        }
        self.actions.push(action);
    }

    /// Record an entry the walk could not read
    pub fn record_walk_error(&mut self) {
        self.stats.walk_errors += 1;
    }

    /// Append another plan (e.g. the orphan pass after the source pass)
    pub fn append(&mut self, other: SyncPlan) {
        self.actions.extend(other.actions);
        self.stats.dir_count += other.stats.dir_count;
        self.stats.create_count += other.stats.create_count;
        self.stats.update_count += other.stats.update_count;
        self.stats.skip_count += other.stats.skip_count;
        self.stats.delete_count += other.stats.delete_count;
        self.stats.walk_errors += other.stats.walk_errors;
    }

    /// True when executing the plan would not change the destination
    /// beyond creating directories
    pub fn is_noop(&self) -> bool {
        self.stats.create_count == 0 && self.stats.update_count == 0 && self.stats.delete_count == 0
    }
}

/// Statistics about a sync plan
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlanStats {
    /// Number of CreateDir actions
    pub dir_count: usize,

    /// Number of CopyNew actions
    pub create_count: usize,

    /// Number of Overwrite actions
    pub update_count: usize,

    /// Number of Skip actions
    pub skip_count: usize,

    /// Number of Delete and DeleteDir actions
    pub delete_count: usize,

    /// Entries that could not be read while walking
    pub walk_errors: usize,
}
