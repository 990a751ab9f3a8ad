//! Timer-driven full syncs

use crate::executor::Synchronizer;
use crate::types::ReplicaError;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Syncs every replication on a fixed interval, on its own thread.
///
/// The first round runs as soon as the scheduler starts. Waiting between rounds
/// blocks on a channel, so [`signal_stop`](Self::signal_stop) wakes it at once
/// instead of at the next interval boundary.
pub struct PeriodicScheduler {
    interval: Duration,
    ticks: Arc<AtomicUsize>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl PeriodicScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ticks: Arc::new(AtomicUsize::new(0)),
            stop_tx: None,
            worker: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Completed sync rounds
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn start(&mut self, synchronizer: Arc<Synchronizer>) -> Result<(), ReplicaError> {
        if self.worker.is_some() {
            return Err(ReplicaError::Validation(
                "Scheduler already started".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(ReplicaError::Config(
                "Sync interval must be greater than zero".to_string(),
            ));
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let interval = self.interval;
        let ticks = Arc::clone(&self.ticks);
        let handle = thread::Builder::new()
            .name("frep-scheduler".to_string())
            .spawn(move || run_schedule(synchronizer, interval, ticks, stop_rx))?;

        self.stop_tx = Some(stop_tx);
        self.worker = Some(handle);
        info!(interval_secs = interval.as_secs(), "periodic sync scheduled");
        Ok(())
    }

    /// Wake the scheduler and tell it to exit after the current replication.
    pub fn signal_stop(&mut self) {
        // Disconnecting the channel is the signal.
        self.stop_tx.take();
    }

    /// Wait for the scheduler thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("scheduler thread panicked");
            }
        }
    }

    pub fn stop(&mut self) {
        self.signal_stop();
        self.join();
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    matches!(stop.try_recv(), Err(TryRecvError::Disconnected) | Ok(()))
}

fn run_schedule(
    synchronizer: Arc<Synchronizer>,
    interval: Duration,
    ticks: Arc<AtomicUsize>,
    stop: Receiver<()>,
) {
    loop {
        let started = Instant::now();
        let replications = synchronizer.store().get_replications();
        debug!(count = replications.len(), "periodic sync round");

        for replication in &replications {
            if stop_requested(&stop) {
                debug!("scheduler stopping mid-round");
                return;
            }
            if let Err(e) = synchronizer.sync_replication(replication) {
                warn!(source = %replication.source.display(), error = %e, "periodic sync failed");
            }
        }
        let round = ticks.fetch_add(1, Ordering::AcqRel) + 1;
        info!(round, elapsed_ms = started.elapsed().as_millis() as u64, "periodic sync round complete");

        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("scheduler exiting");
}
