//! Registering, removing and listing replications

use crate::config::{FileStore, ReplicationStore};
use crate::types::{ReplicaError, Replication};
use std::path::Path;
use tracing::info;

pub fn add(
    store: &FileStore,
    source: &Path,
    destination: &Path,
    exclusions: Vec<String>,
) -> Result<Replication, ReplicaError> {
    let replication = store.add_replication(source, destination, exclusions)?;
    info!(
        source = %replication.source.display(),
        destination = %replication.destination.display(),
        "replication added"
    );
    println!(
        "Added {} → {}",
        replication.source.display(),
        replication.destination.display()
    );
    Ok(replication)
}

pub fn remove(store: &FileStore, source: &Path) -> Result<(), ReplicaError> {
    let removed = store.remove_replication(source)?;
    info!(source = %removed.source.display(), "replication removed");
    println!("Removed {}", removed.source.display());
    Ok(())
}

pub fn list(store: &FileStore) {
    let replications = store.get_replications();
    if replications.is_empty() {
        println!("No replications configured.");
        return;
    }
    for (i, rep) in replications.iter().enumerate() {
        println!(
            "{}. {} → {}",
            i + 1,
            rep.source.display(),
            rep.destination.display()
        );
        if !rep.exclusions.is_empty() {
            println!("   Exclusions: {}", rep.exclusions.join(", "));
        }
    }
}
