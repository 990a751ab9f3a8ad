//! Watch mode command

use crate::config::{interval_from_minutes, FileStore, ReplicationStore};
use crate::executor::Synchronizer;
use crate::types::ReplicaError;
use crate::watch::WatchService;
use std::sync::Arc;
use tracing::info;

/// Run watch mode until Ctrl+C or SIGTERM, then stop and clean up.
pub fn run(store: Arc<FileStore>, interval_minutes: Option<u64>) -> Result<(), ReplicaError> {
    let settings = store.settings();
    let minutes = interval_minutes.unwrap_or(settings.sync_interval_minutes);
    let interval = interval_from_minutes(minutes)?;

    let count = store.get_replications().len();
    let synchronizer = Arc::new(Synchronizer::new(store).with_settings(&settings));
    let mut service = WatchService::new(synchronizer, settings.debounce_window());
    service.start_watch(interval)?;

    println!(
        "Watching {} replication(s), full sync every {} minute(s). Press Ctrl+C to stop.",
        count, minutes
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(shutdown_signal())?;

    println!("Stopping watchers...");
    service.cleanup();
    info!("watch mode stopped");
    Ok(())
}

async fn shutdown_signal() -> Result<(), ReplicaError> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            res = ctrl_c => res?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await?;

    info!("shutdown signal received");
    Ok(())
}
