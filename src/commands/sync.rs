//! Sync and dry-run commands

use crate::config::{FileStore, ReplicationStore};
use crate::executor::Synchronizer;
use crate::types::{ReplicaError, Replication, SyncStats};
use crate::ui::{self, ProgressReporter};
use std::path::Path;
use std::sync::Arc;

/// Replications addressed by an optional source argument
pub fn select(store: &FileStore, source: Option<&Path>) -> Result<Vec<Replication>, ReplicaError> {
    match source {
        Some(source) => Ok(vec![store.find(source)?]),
        None => Ok(store.get_replications()),
    }
}

/// Sync the selected replications with a progress spinner.
///
/// Returns the combined statistics and the number of replications that
/// aborted at the root.
pub fn run(
    store: Arc<FileStore>,
    source: Option<&Path>,
    show_progress: bool,
) -> Result<(SyncStats, usize), ReplicaError> {
    let replications = select(&store, source)?;
    if replications.is_empty() {
        println!("No replications configured. Use `frep add <source> <destination>`.");
        return Ok((SyncStats::default(), 0));
    }

    let settings = store.settings();
    let reporter = Arc::new(if show_progress {
        ProgressReporter::new()
    } else {
        ProgressReporter::hidden()
    });
    let synchronizer = {
        let reporter = Arc::clone(&reporter);
        Synchronizer::new(store)
            .with_settings(&settings)
            .on_event(move |event| reporter.handle(event))
    };

    let mut total = SyncStats::default();
    let mut aborted = 0;
    for replication in &replications {
        match synchronizer.sync_replication(replication) {
            Ok(stats) => {
                total += stats;
                println!("{}", ui::format_stats(replication, &stats));
            }
            Err(e) => {
                aborted += 1;
                eprintln!(
                    "{} {}: {}",
                    console::style("✗").red(),
                    replication.source.display(),
                    e
                );
            }
        }
    }
    reporter.finish();
    Ok((total, aborted))
}

/// Print what a sync would do without changing anything
pub fn dry_run(store: Arc<FileStore>, source: Option<&Path>) -> Result<(), ReplicaError> {
    let replications = select(&store, source)?;
    let synchronizer = Synchronizer::new(store);

    for replication in &replications {
        println!(
            "{} → {}",
            replication.source.display(),
            replication.destination.display()
        );
        let plan = synchronizer.plan(replication)?;
        println!("{}", ui::format_plan_preview(&plan));
        println!("{}", ui::format_dry_run_actions(&plan));
    }
    println!("Dry-run mode: no changes were made.");
    Ok(())
}
