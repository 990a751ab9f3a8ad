//! Per-replication filesystem subscriptions

use super::debounce::{ChangeKind, Debouncer};
use crate::executor::Synchronizer;
use crate::matcher::is_excluded;
use crate::types::{ReplicaError, Replication};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Lifecycle of a watch session: `Idle -> Watching -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Idle = 0,
    Watching = 1,
    Stopping = 2,
    Stopped = 3,
}

impl SessionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SessionState::Idle,
            1 => SessionState::Watching,
            2 => SessionState::Stopping,
            _ => SessionState::Stopped,
        }
    }
}

/// Work item for the session's sync worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    /// An accepted change; the worker syncs the replication
    Trigger { kind: ChangeKind, path: PathBuf },
    /// The notification backend reported an error; the session tears down
    Failed(String),
}

/// State shared between the notify callback and the worker thread
#[derive(Debug)]
pub(crate) struct SessionShared {
    replication: Replication,
    state: AtomicU8,
    debouncer: Debouncer,
    dispatched: AtomicUsize,
}

impl SessionShared {
    pub(crate) fn new(replication: Replication, debounce: Duration) -> Self {
        Self {
            replication,
            state: AtomicU8::new(SessionState::Idle as u8),
            debouncer: Debouncer::new(debounce),
            dispatched: AtomicUsize::new(0),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `from -> to` only if the session is currently in `from`
    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Turn a raw notification into a trigger, or drop it.
    ///
    /// Dropped: anything outside `Watching`, access events, modifications that
    /// only touch directories, events whose paths are all excluded, and
    /// modifications inside the debounce window.
    pub(crate) fn handle_event(&self, event: &Event) -> Option<WatchMessage> {
        if self.state() != SessionState::Watching {
            return None;
        }
        let kind = ChangeKind::from_event_kind(&event.kind)?;
        let path = event.paths.first().cloned().unwrap_or_default();

        if kind == ChangeKind::Modified && !event.paths.is_empty() && event.paths.iter().all(|p| p.is_dir()) {
            return None;
        }

        let root = &self.replication.source;
        let all_excluded = !event.paths.is_empty()
            && event.paths.iter().all(|p| {
                p.strip_prefix(root)
                    .is_ok_and(|rel| is_excluded(rel, &self.replication.exclusions))
            });
        if all_excluded {
            debug!(path = %path.display(), "ignoring change to excluded path");
            return None;
        }

        if !self.debouncer.should_trigger(kind) {
            debug!(path = %path.display(), "modification debounced");
            return None;
        }

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        Some(WatchMessage::Trigger { kind, path })
    }
}

/// One recursive subscription on a replication's source root, plus the
/// worker thread that runs the syncs it triggers.
pub struct WatchSession {
    shared: Arc<SessionShared>,
    subscription: Arc<Mutex<Option<RecommendedWatcher>>>,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl WatchSession {
    pub fn new(replication: Replication, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(SessionShared::new(replication, debounce)),
            subscription: Arc::new(Mutex::new(None)),
            stop_tx: None,
            worker: None,
        }
    }

    pub fn replication(&self) -> &Replication {
        &self.shared.replication
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Number of syncs dispatched to the worker so far
    pub fn triggered(&self) -> usize {
        self.shared.dispatched.load(Ordering::Relaxed)
    }

    /// Subscribe to the source tree and start the worker.
    ///
    /// # Errors
    /// `Validation` if the session is not idle, `Watch` if the subscription
    /// cannot be established.
    pub fn start(&mut self, synchronizer: Arc<Synchronizer>) -> Result<(), ReplicaError> {
        if self.state() != SessionState::Idle {
            return Err(ReplicaError::Validation(
                "Watch session already started".to_string(),
            ));
        }

        let (msg_tx, msg_rx) = unbounded::<WatchMessage>();
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

        let callback_shared = Arc::clone(&self.shared);
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let message = match res {
                    Ok(event) => callback_shared.handle_event(&event),
                    Err(e) => Some(WatchMessage::Failed(e.to_string())),
                };
                if let Some(message) = message {
                    let _ = msg_tx.send(message);
                }
            },
            notify::Config::default(),
        )
        .inspect_err(|_| self.shared.set_state(SessionState::Stopped))?;

        let source = self.shared.replication.source.clone();
        if let Err(e) = watcher.watch(&source, RecursiveMode::Recursive) {
            self.shared.set_state(SessionState::Stopped);
            return Err(e.into());
        }
        *self.lock_subscription() = Some(watcher);
        self.shared.set_state(SessionState::Watching);

        let worker_shared = Arc::clone(&self.shared);
        let subscription = Arc::clone(&self.subscription);
        let spawned = thread::Builder::new()
            .name("frep-watch".to_string())
            .spawn(move || run_worker(worker_shared, subscription, synchronizer, msg_rx, stop_rx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.release_subscription();
                self.shared.set_state(SessionState::Stopped);
                return Err(e.into());
            }
        };

        self.stop_tx = Some(stop_tx);
        self.worker = Some(handle);
        info!(source = %source.display(), "watching for changes");
        Ok(())
    }

    /// Stop dispatching new syncs. In-flight syncs keep running.
    pub fn signal_stop(&mut self) {
        if !self.shared.transition(SessionState::Watching, SessionState::Stopping) {
            self.shared
                .transition(SessionState::Idle, SessionState::Stopping);
        }
        self.stop_tx.take();
    }

    /// Drop the filesystem subscription.
    pub fn release_subscription(&self) {
        self.lock_subscription().take();
    }

    /// Wait for the worker to finish its current sync, then mark the session stopped.
    pub fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!(source = %self.shared.replication.source.display(), "watch worker panicked");
            }
        }
        self.shared.set_state(SessionState::Stopped);
    }

    /// Signal, unsubscribe and join.
    pub fn stop(&mut self) {
        self.signal_stop();
        self.release_subscription();
        self.join();
    }

    fn lock_subscription(&self) -> std::sync::MutexGuard<'_, Option<RecommendedWatcher>> {
        self.subscription.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        if self.state() != SessionState::Stopped {
            self.stop();
        }
    }
}

fn run_worker(
    shared: Arc<SessionShared>,
    subscription: Arc<Mutex<Option<RecommendedWatcher>>>,
    synchronizer: Arc<Synchronizer>,
    messages: Receiver<WatchMessage>,
    stop: Receiver<()>,
) {
    let source = shared.replication.source.clone();
    loop {
        let message = select! {
            recv(messages) -> msg => match msg {
                Ok(msg) => msg,
                Err(_) => break,
            },
            recv(stop) -> _ => break,
        };

        if shared.state() != SessionState::Watching {
            break;
        }

        match message {
            WatchMessage::Trigger { kind, path } => {
                info!(source = %source.display(), path = %path.display(), change = ?kind, "change detected");
                if let Err(e) = synchronizer.sync_replication(&shared.replication) {
                    warn!(source = %source.display(), error = %e, "triggered sync failed");
                }
            }
            WatchMessage::Failed(reason) => {
                error!(source = %source.display(), error = %reason, "watch session failed, tearing it down");
                shared.transition(SessionState::Watching, SessionState::Stopping);
                subscription
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                break;
            }
        }
    }
    debug!(source = %source.display(), "watch worker exiting");
}
