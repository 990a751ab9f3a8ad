//! Status command

use crate::config::{FileStore, ReplicationStore};
use crate::executor::Synchronizer;
use crate::types::{ReplicaError, Replication, StatusReport};
use crate::ui;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct StatusEntry<'a> {
    #[serde(flatten)]
    replication: &'a Replication,
    status: StatusReport,
}

pub fn run(store: Arc<FileStore>, json: bool) -> Result<(), ReplicaError> {
    let replications = store.get_replications();
    let synchronizer = Synchronizer::new(store);
    let reports: Vec<StatusReport> = replications
        .iter()
        .map(|rep| synchronizer.check_status(rep))
        .collect();

    if json {
        let entries: Vec<StatusEntry<'_>> = replications
            .iter()
            .zip(reports)
            .map(|(replication, status)| StatusEntry {
                replication,
                status,
            })
            .collect();
        let rendered = serde_json::to_string_pretty(&entries)
            .map_err(|e| ReplicaError::Store(format!("Failed to encode status: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    if replications.is_empty() {
        println!("No replications configured.");
        return Ok(());
    }
    for (rep, report) in replications.iter().zip(&reports) {
        println!("{}\n", ui::format_status(rep, report));
    }
    Ok(())
}
