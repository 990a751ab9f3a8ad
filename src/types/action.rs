//! SyncAction - Actions determined by the diff engine

use std::path::{Path, PathBuf};

/// One step of a sync plan.
///
/// All paths are relative to the replication roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Ensure the mirrored directory exists in the destination
    CreateDir(PathBuf),

    /// Copy new file (exists in src, missing in dest)
    CopyNew(PathBuf),

    /// Overwrite existing file (src and dest differ)
    Overwrite(PathBuf),

    /// Leave the destination alone (identical or excluded)
    Skip(PathBuf),

    /// Delete orphaned destination file
    Delete(PathBuf),

    /// Delete orphaned destination directory with everything below it
    DeleteDir(PathBuf),
}

impl SyncAction {
    /// Relative path this action applies to
    pub fn path(&self) -> &Path {
        match self {
            SyncAction::CreateDir(p)
            | SyncAction::CopyNew(p)
            | SyncAction::Overwrite(p)
            | SyncAction::Skip(p)
            | SyncAction::Delete(p)
            | SyncAction::DeleteDir(p) => p,
        }
    }

    /// Short label used in logs and dry-run output
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::CreateDir(_) => "Mkdir",
            SyncAction::CopyNew(_) => "Copy",
            SyncAction::Overwrite(_) => "Update",
            SyncAction::Skip(_) => "Skip",
            SyncAction::Delete(_) => "Delete",
            SyncAction::DeleteDir(_) => "Delete dir",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, SyncAction::Skip(_))
    }

    /// Copy-type actions write file content into the destination
    pub fn is_transfer(&self) -> bool {
        matches!(self, SyncAction::CopyNew(_) | SyncAction::Overwrite(_))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, SyncAction::Delete(_) | SyncAction::DeleteDir(_))
    }
}
