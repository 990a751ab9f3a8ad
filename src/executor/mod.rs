//! Executor - applies diff plans and commits sync results

pub mod copy;

use crate::config::{ReplicationStore, Settings};
use crate::diff::{DiffEngine, SyncPlan};
use crate::types::{ReplicaError, Replication, StatusReport, SyncAction, SyncStats};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub use copy::{copy_file, safe_copy};

/// Events emitted while a replication is being synced.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Sync of a replication started.
    Started { source: PathBuf, destination: PathBuf },
    /// A file was written to the destination.
    Copied { path: PathBuf, updated: bool },
    /// An orphaned destination entry was deleted.
    Removed { path: PathBuf },
    /// A per-entry operation failed; the sync continues.
    Failed { action: &'static str, path: PathBuf },
    /// Both passes finished (with or without per-entry errors).
    Finished { source: PathBuf, stats: SyncStats },
}

/// Optional callback used to receive sync events.
pub type SyncCallback = dyn Fn(&SyncEvent) + Send + Sync;

/// Per-replication mutexes keyed by source path
#[derive(Debug, Default)]
struct ReplicationLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ReplicationLocks {
    fn handle(&self, source: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(source.to_path_buf()).or_default())
    }
}

/// Runs the two-pass sync for replications and reports to the store.
///
/// Shared between the caller, the change watcher and the periodic scheduler,
/// so every method takes `&self`.
pub struct Synchronizer {
    store: Arc<dyn ReplicationStore>,
    locks: Option<ReplicationLocks>,
    on_event: Option<Box<SyncCallback>>,
}

impl Synchronizer {
    /// Create a synchronizer that serialises syncs of the same replication.
    pub fn new(store: Arc<dyn ReplicationStore>) -> Self {
        Self {
            store,
            locks: Some(ReplicationLocks::default()),
            on_event: None,
        }
    }

    /// Apply engine settings
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.serialize_syncs(settings.serialize_syncs)
    }

    /// Enable or disable the per-replication lock.
    ///
    /// Without it, concurrent triggers for one replication may interleave; each
    /// file copy is still independently atomic.
    pub fn serialize_syncs(mut self, enabled: bool) -> Self {
        self.locks = enabled.then(ReplicationLocks::default);
        self
    }

    /// Install a progress callback
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Box::new(callback));
        self
    }

    pub fn store(&self) -> &Arc<dyn ReplicationStore> {
        &self.store
    }

    /// Sync every configured replication, one after another.
    ///
    /// A root-level failure of one replication does not stop the others.
    pub fn sync_all(&self) -> Vec<(Replication, Result<SyncStats, ReplicaError>)> {
        let replications = self.store.get_replications();
        info!(count = replications.len(), "starting synchronization for all replications");

        replications
            .into_iter()
            .map(|rep| {
                let result = self.sync_replication(&rep);
                (rep, result)
            })
            .collect()
    }

    /// Make `replication.destination` mirror `replication.source`.
    ///
    /// Pass 1 creates directories and copies new or changed files; pass 2 then
    /// deletes destination entries whose source counterpart no longer exists.
    /// Per-file and per-directory failures are counted in `errors`.
    ///
    /// # Errors
    /// * `SourceMissing` - the source root is not a directory
    /// * `DestinationRoot` - the destination root cannot be created
    pub fn sync_replication(&self, replication: &Replication) -> Result<SyncStats, ReplicaError> {
        let lock = self.locks.as_ref().map(|l| l.handle(&replication.source));
        let _guard = lock
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner));

        let source = &replication.source;
        let destination = &replication.destination;
        info!(source = %source.display(), destination = %destination.display(), "starting synchronization");
        let started = Instant::now();

        let engine = DiffEngine::new(replication);
        let source_plan = engine.source_pass().inspect_err(|e| {
            error!(source = %source.display(), error = %e, "synchronization aborted");
        })?;

        if let Err(e) = ensure_dir(destination) {
            error!(destination = %destination.display(), error = %e, "failed to create destination directory");
            return Err(ReplicaError::DestinationRoot {
                path: destination.clone(),
                source: e,
            });
        }

        self.emit(SyncEvent::Started {
            source: source.clone(),
            destination: destination.clone(),
        });

        let mut stats = SyncStats::default();
        self.apply_source_plan(replication, &source_plan, &mut stats);

        // Orphans are judged against the source as it is now, after pass 1.
        let orphan_plan = engine.orphan_pass();
        self.apply_orphan_plan(replication, &orphan_plan, &mut stats);

        if let Err(e) = self.store.update_last_sync(source, Utc::now()) {
            warn!(source = %source.display(), error = %e, "failed to record last sync time");
        }

        info!(
            source = %source.display(),
            copied = stats.copied,
            skipped = stats.skipped,
            removed = stats.removed,
            errors = stats.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "synchronization finished"
        );
        self.emit(SyncEvent::Finished {
            source: source.clone(),
            stats,
        });

        Ok(stats)
    }

    /// Compute what a sync would do, without touching anything.
    pub fn plan(&self, replication: &Replication) -> Result<SyncPlan, ReplicaError> {
        DiffEngine::new(replication).plan()
    }

    fn apply_source_plan(&self, rep: &Replication, plan: &SyncPlan, stats: &mut SyncStats) {
        stats.errors += plan.stats.walk_errors;
        let mut failed_dirs: HashSet<&Path> = HashSet::new();

        for action in &plan.actions {
            let rel = action.path();

            if let SyncAction::CreateDir(_) = action {
                let dest_dir = rep.destination.join(rel);
                if let Err(e) = ensure_dir(&dest_dir) {
                    warn!(dir = %dest_dir.display(), error = %e, "failed to create directory");
                    stats.errors += 1;
                    failed_dirs.insert(rel);
                    self.emit_failure(action, rel);
                }
                continue;
            }

            let parent = rel.parent().unwrap_or(Path::new(""));
            if failed_dirs.contains(parent) {
                continue;
            }

            if action.is_skip() {
                stats.skipped += 1;
                continue;
            }
            if !action.is_transfer() {
                debug!(action = action.action_name(), "ignoring action in source pass");
                continue;
            }

            let src_file = rep.source.join(rel);
            let dest_file = rep.destination.join(rel);
            if safe_copy(&src_file, &dest_file) {
                stats.copied += 1;
                info!(src = %src_file.display(), dest = %dest_file.display(), "copied");
                self.emit(SyncEvent::Copied {
                    path: rel.to_path_buf(),
                    updated: matches!(action, SyncAction::Overwrite(_)),
                });
            } else {
                stats.errors += 1;
                self.emit_failure(action, rel);
            }
        }
    }

    fn apply_orphan_plan(&self, rep: &Replication, plan: &SyncPlan, stats: &mut SyncStats) {
        stats.errors += plan.stats.walk_errors;

        for action in &plan.actions {
            if !action.is_delete() {
                continue;
            }
            let rel = action.path();
            let target = rep.destination.join(rel);
            let result = match action {
                SyncAction::DeleteDir(_) => copy::remove_dir_tree(&target),
                _ => copy::remove_file(&target),
            };

            match result {
                Ok(()) => {
                    stats.removed += 1;
                    info!(path = %target.display(), "removed (source deleted)");
                    self.emit(SyncEvent::Removed {
                        path: rel.to_path_buf(),
                    });
                }
                Err(e) => {
                    stats.errors += 1;
                    error!(path = %target.display(), error = %e, "error removing orphan");
                    self.emit_failure(action, rel);
                }
            }
        }
    }

    /// Hash-free file counts for both roots.
    ///
    /// `pending_changes` is only `source_files - dest_files` (floored at zero).
    /// A missing root counts as zero files and one error.
    pub fn check_status(&self, replication: &Replication) -> StatusReport {
        let mut report = StatusReport {
            last_sync: replication.last_sync,
            ..StatusReport::default()
        };

        let (source_files, source_errors) = count_files(&replication.source);
        let (dest_files, dest_errors) = count_files(&replication.destination);
        report.source_files = source_files;
        report.dest_files = dest_files;
        report.errors = source_errors + dest_errors;
        report.pending_changes = source_files.saturating_sub(dest_files);
        report
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }

    fn emit_failure(&self, action: &SyncAction, rel: &Path) {
        self.emit(SyncEvent::Failed {
            action: action.action_name(),
            path: rel.to_path_buf(),
        });
    }
}

/// Create `path` as a directory, replacing a non-directory standing there.
fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Ok(meta) = fs::symlink_metadata(path) {
        if meta.is_dir() {
            return Ok(());
        }
        fs::remove_file(path)?;
    }
    fs::create_dir_all(path)
}

/// Count regular files under `root`, returning `(files, errors)`.
fn count_files(root: &Path) -> (usize, usize) {
    if !root.is_dir() {
        warn!(path = %root.display(), "path does not exist");
        return (0, 1);
    }

    let mut files = 0;
    let mut errors = 0;
    for result in ignore::WalkBuilder::new(root).standard_filters(false).build() {
        match result {
            Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => files += 1,
            Ok(_) => {}
            Err(e) => {
                warn!(root = %root.display(), error = %e, "error while counting files");
                errors += 1;
            }
        }
    }
    (files, errors)
}
