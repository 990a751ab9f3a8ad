//! Tree walking and action classification

use crate::diff::{files_identical, SyncPlan};
use crate::matcher::is_excluded;
use crate::types::{ReplicaError, Replication, SyncAction};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Computes the work needed to make a destination mirror its source.
///
/// Exclusions are matched against an entry's path relative to the replication
/// root, so a pattern covers the same entries on either side regardless of
/// where the roots live.
pub struct DiffEngine<'a> {
    replication: &'a Replication,
}

impl<'a> DiffEngine<'a> {
    pub fn new(replication: &'a Replication) -> Self {
        Self { replication }
    }

    /// Whether the entry at `rel` (relative to either root) is excluded
    pub fn is_excluded(&self, rel: &Path) -> bool {
        is_excluded(rel, &self.replication.exclusions)
    }

    /// Plan both passes without touching the filesystem.
    pub fn plan(&self) -> Result<SyncPlan, ReplicaError> {
        let mut plan = self.source_pass()?;
        plan.append(self.orphan_pass());
        Ok(plan)
    }

    /// Pass 1: classify every source entry against the destination.
    ///
    /// Excluded subdirectories are pruned before descent; excluded files are
    /// reported as `Skip`. Directories are emitted before their contents.
    ///
    /// # Errors
    /// `SourceMissing` when the source root is not a readable directory.
    pub fn source_pass(&self) -> Result<SyncPlan, ReplicaError> {
        let source = &self.replication.source;
        if !source.is_dir() {
            return Err(ReplicaError::SourceMissing {
                path: source.clone(),
            });
        }

        let mut plan = SyncPlan::new();
        let exclusions = self.replication.exclusions.clone();
        let root = source.clone();
        let walker = ignore::WalkBuilder::new(source)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if entry.depth() == 0 || !is_dir {
                    return true;
                }
                let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                !is_excluded(rel, &exclusions)
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "error during source traversal");
                    plan.record_walk_error();
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let rel = match entry.path().strip_prefix(source) {
                Ok(p) => p.to_path_buf(),
                Err(_) => continue,
            };
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());

            if is_dir {
                plan.add_action(SyncAction::CreateDir(rel));
            } else if entry.path().is_file() {
                plan.add_action(self.classify_file(rel));
            } else {
                debug!(path = %entry.path().display(), "skipping non-regular entry");
            }
        }

        Ok(plan)
    }

    fn classify_file(&self, rel: PathBuf) -> SyncAction {
        if self.is_excluded(&rel) {
            return SyncAction::Skip(rel);
        }

        let src_file = self.replication.source.join(&rel);
        let dest_file = self.replication.destination.join(&rel);

        if fs::symlink_metadata(&dest_file).is_err() {
            SyncAction::CopyNew(rel)
        } else if files_identical(&src_file, &dest_file) {
            SyncAction::Skip(rel)
        } else {
            SyncAction::Overwrite(rel)
        }
    }

    /// Pass 2: find destination entries whose source counterpart is gone.
    ///
    /// Excluded destination paths are never reported, even without a source
    /// counterpart. An orphaned directory is reported once as `DeleteDir`,
    /// unless something excluded lives inside it; then only its non-excluded
    /// contents are reported. A missing destination root yields an empty plan.
    pub fn orphan_pass(&self) -> SyncPlan {
        let mut plan = SyncPlan::new();
        if self.replication.destination.is_dir() {
            self.collect_orphans(Path::new(""), &mut plan);
        }
        plan
    }

    /// Collect orphans under `rel`; returns true if anything under it stays.
    fn collect_orphans(&self, rel: &Path, plan: &mut SyncPlan) -> bool {
        let dest_dir = self.replication.destination.join(rel);
        let src_dir = self.replication.source.join(rel);

        let mut entries: Vec<_> = match fs::read_dir(&dest_dir) {
            Ok(iter) => iter
                .filter_map(|e| match e {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        warn!(dir = %dest_dir.display(), error = %err, "unreadable destination entry");
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!(dir = %dest_dir.display(), error = %e, "cannot read destination directory");
                plan.record_walk_error();
                return true;
            }
        };
        entries.sort_by_key(|e| e.file_name());

        let mut retained = false;
        for entry in entries {
            let name = entry.file_name();
            let child_rel = rel.join(&name);
            if self.is_excluded(&child_rel) {
                retained = true;
                continue;
            }

            let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
            let has_counterpart = src_dir.join(&name).exists();

            match (is_dir, has_counterpart) {
                (true, true) => {
                    self.collect_orphans(&child_rel, plan);
                    retained = true;
                }
                (true, false) if self.replication.exclusions.is_empty() => {
                    plan.add_action(SyncAction::DeleteDir(child_rel));
                }
                (true, false) => {
                    let mut inner = SyncPlan::new();
                    if self.collect_orphans(&child_rel, &mut inner) {
                        plan.append(inner);
                        retained = true;
                    } else {
                        plan.add_action(SyncAction::DeleteDir(child_rel));
                    }
                }
                (false, false) => plan.add_action(SyncAction::Delete(child_rel)),
                (false, true) => retained = true,
            }
        }
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir) {
        (TempDir::new().unwrap(), TempDir::new().unwrap())
    }

    fn rep(src: &TempDir, dst: &TempDir) -> Replication {
        Replication::new(src.path(), dst.path())
    }

    #[test]
    fn test_source_pass_emits_dirs_before_files() {
        let (src, dst) = setup();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("a/b/f.txt"), b"x").unwrap();

        let r = rep(&src, &dst);
        let plan = DiffEngine::new(&r).source_pass().unwrap();

        assert_eq!(
            plan.actions,
            vec![
                SyncAction::CreateDir(PathBuf::from("a")),
                SyncAction::CreateDir(PathBuf::from("a/b")),
                SyncAction::CopyNew(PathBuf::from("a/b/f.txt")),
            ]
        );
    }

    #[test]
    fn test_source_pass_classifies_update_and_skip() {
        let (src, dst) = setup();
        fs::write(src.path().join("same.txt"), b"abc").unwrap();
        fs::write(dst.path().join("same.txt"), b"abc").unwrap();
        fs::write(src.path().join("diff.txt"), b"abc").unwrap();
        fs::write(dst.path().join("diff.txt"), b"abd").unwrap();

        let r = rep(&src, &dst);
        let plan = DiffEngine::new(&r).source_pass().unwrap();

        assert!(plan
            .actions
            .contains(&SyncAction::Skip(PathBuf::from("same.txt"))));
        assert!(plan
            .actions
            .contains(&SyncAction::Overwrite(PathBuf::from("diff.txt"))));
    }

    #[test]
    fn test_excluded_directory_is_pruned() {
        let (src, dst) = setup();
        fs::create_dir_all(src.path().join("cache")).unwrap();
        fs::write(src.path().join("cache/blob"), b"x").unwrap();
        fs::write(src.path().join("keep.txt"), b"x").unwrap();

        let r = rep(&src, &dst).with_exclusions(["cache"]);
        let plan = DiffEngine::new(&r).source_pass().unwrap();

        assert_eq!(
            plan.actions,
            vec![SyncAction::CopyNew(PathBuf::from("keep.txt"))]
        );
    }

    #[test]
    fn test_missing_source_is_error() {
        let (src, dst) = setup();
        let r = Replication::new(src.path().join("nope"), dst.path());
        let err = DiffEngine::new(&r).source_pass().unwrap_err();
        assert!(matches!(err, ReplicaError::SourceMissing { .. }));
    }

    #[test]
    fn test_orphan_pass_reports_dir_once() {
        let (src, dst) = setup();
        fs::create_dir_all(dst.path().join("gone/deep")).unwrap();
        fs::write(dst.path().join("gone/deep/x"), b"x").unwrap();
        fs::write(dst.path().join("stale.txt"), b"x").unwrap();

        let r = rep(&src, &dst);
        let plan = DiffEngine::new(&r).orphan_pass();

        assert_eq!(
            plan.actions,
            vec![
                SyncAction::DeleteDir(PathBuf::from("gone")),
                SyncAction::Delete(PathBuf::from("stale.txt")),
            ]
        );
    }

    #[test]
    fn test_orphan_pass_leaves_excluded_alone() {
        let (src, dst) = setup();
        fs::create_dir_all(dst.path().join("node_modules/pkg")).unwrap();
        fs::write(dst.path().join("local.cache"), b"x").unwrap();

        let r = rep(&src, &dst).with_exclusions(["node_modules", ".cache"]);
        let plan = DiffEngine::new(&r).orphan_pass();
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn test_orphan_dir_holding_excluded_entry_is_not_removed_whole() {
        let (src, dst) = setup();
        fs::create_dir_all(dst.path().join("old/cache")).unwrap();
        fs::create_dir_all(dst.path().join("old/sub")).unwrap();
        fs::write(dst.path().join("old/cache/keep.bin"), b"x").unwrap();
        fs::write(dst.path().join("old/sub/x"), b"x").unwrap();
        fs::write(dst.path().join("old/stale.txt"), b"x").unwrap();

        let r = rep(&src, &dst).with_exclusions(["cache/"]);
        let plan = DiffEngine::new(&r).orphan_pass();

        assert_eq!(
            plan.actions,
            vec![
                SyncAction::Delete(PathBuf::from("old/stale.txt")),
                SyncAction::DeleteDir(PathBuf::from("old/sub")),
            ]
        );
    }

    #[test]
    fn test_orphan_pass_missing_destination() {
        let (src, dst) = setup();
        let r = Replication::new(src.path(), dst.path().join("fresh"));
        assert!(DiffEngine::new(&r).orphan_pass().actions.is_empty());
    }
}
