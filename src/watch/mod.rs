//! Watch mode: change-triggered syncs plus the periodic full sync
//!
//! [`ChangeWatcher`] owns one [`WatchSession`] per replication. Each session's
//! notify callback only classifies and debounces; syncs run on the session's
//! worker thread so a slow sync never blocks event delivery.
//! [`PeriodicScheduler`] runs alongside it on its own thread.

pub mod debounce;
pub mod scheduler;
pub mod session;

pub use debounce::{ChangeKind, Debouncer};
pub use scheduler::PeriodicScheduler;
pub use session::{SessionState, WatchMessage, WatchSession};

use crate::executor::Synchronizer;
use crate::types::ReplicaError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Filesystem subscriptions for every configured replication
pub struct ChangeWatcher {
    synchronizer: Arc<Synchronizer>,
    debounce: Duration,
    sessions: Vec<WatchSession>,
}

impl ChangeWatcher {
    pub fn new(synchronizer: Arc<Synchronizer>, debounce: Duration) -> Self {
        Self {
            synchronizer,
            debounce,
            sessions: Vec::new(),
        }
    }

    /// Subscribe to every replication's source tree.
    ///
    /// A replication whose subscription fails is logged and skipped; the
    /// others are still watched. Returns the number of active sessions.
    pub fn start(&mut self) -> usize {
        for replication in self.synchronizer.store().get_replications() {
            let mut session = WatchSession::new(replication, self.debounce);
            match session.start(Arc::clone(&self.synchronizer)) {
                Ok(()) => self.sessions.push(session),
                Err(e) => warn!(
                    source = %session.replication().source.display(),
                    error = %e,
                    "cannot watch replication"
                ),
            }
        }
        self.sessions.len()
    }

    pub fn sessions(&self) -> &[WatchSession] {
        &self.sessions
    }

    /// Sessions still dispatching events
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.state() == SessionState::Watching)
            .count()
    }

    pub fn signal_stop(&mut self) {
        self.sessions.iter_mut().for_each(WatchSession::signal_stop);
    }

    pub fn release_subscriptions(&self) {
        self.sessions.iter().for_each(WatchSession::release_subscription);
    }

    pub fn join(&mut self) {
        self.sessions.iter_mut().for_each(WatchSession::join);
    }

    /// Drop all sessions. Call after [`join`](Self::join).
    pub fn clear(&mut self) {
        self.sessions.clear();
    }
}

/// Lifecycle controller for watch mode, driven by the presentation layer.
pub struct WatchService {
    synchronizer: Arc<Synchronizer>,
    debounce: Duration,
    watcher: Option<ChangeWatcher>,
    scheduler: Option<PeriodicScheduler>,
}

impl WatchService {
    pub fn new(synchronizer: Arc<Synchronizer>, debounce: Duration) -> Self {
        Self {
            synchronizer,
            debounce,
            watcher: None,
            scheduler: None,
        }
    }

    /// Start the change watcher and a periodic full sync every `interval`.
    ///
    /// # Errors
    /// `Validation` if watch mode is already running, `Config` for a zero interval.
    pub fn start_watch(&mut self, interval: Duration) -> Result<(), ReplicaError> {
        if self.is_running() {
            return Err(ReplicaError::Validation(
                "Watch mode is already running".to_string(),
            ));
        }

        let mut scheduler = PeriodicScheduler::new(interval);
        scheduler.start(Arc::clone(&self.synchronizer))?;

        let mut watcher = ChangeWatcher::new(Arc::clone(&self.synchronizer), self.debounce);
        let watched = watcher.start();
        info!(watched, interval_secs = interval.as_secs(), "watch mode started");

        self.watcher = Some(watcher);
        self.scheduler = Some(scheduler);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.as_ref().is_some_and(PeriodicScheduler::is_running)
            || self.watcher.as_ref().is_some_and(|w| w.active_sessions() > 0)
    }

    pub fn watcher(&self) -> Option<&ChangeWatcher> {
        self.watcher.as_ref()
    }

    pub fn scheduler(&self) -> Option<&PeriodicScheduler> {
        self.scheduler.as_ref()
    }

    /// Stop watch mode. On return no background sync is running or will start.
    pub fn stop(&mut self) {
        if self.scheduler.is_none() && self.watcher.is_none() {
            return;
        }
        info!("stopping watch mode");

        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.signal_stop();
        }
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.signal_stop();
            watcher.release_subscriptions();
            watcher.join();
        }
        if let Some(scheduler) = self.scheduler.as_mut() {
            scheduler.join();
        }
    }

    /// Stop if needed and release every session.
    pub fn cleanup(&mut self) {
        self.stop();
        if let Some(mut watcher) = self.watcher.take() {
            watcher.clear();
        }
        self.scheduler = None;
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        self.cleanup();
    }
}
