//! Change classification and the modification debounce

use notify::event::ModifyKind;
use notify::EventKind;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Filesystem change relevant to replication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

impl ChangeKind {
    /// Map a notify event kind; access notifications are irrelevant.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Remove(_) => Some(ChangeKind::Deleted),
            EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Moved),
            EventKind::Modify(_) | EventKind::Any | EventKind::Other => Some(ChangeKind::Modified),
            EventKind::Access(_) => None,
        }
    }

    /// Only modifications are rate-limited; the rest are acted on immediately.
    pub fn is_debounced(self) -> bool {
        self == ChangeKind::Modified
    }
}

/// Rate limit for modification-triggered syncs of one watch session.
///
/// A modification is accepted when at least `window` has passed since the
/// previously accepted one. Check and update happen under one lock so two
/// near-simultaneous events cannot both pass.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether a change observed now should trigger a sync
    pub fn should_trigger(&self, kind: ChangeKind) -> bool {
        self.should_trigger_at(kind, Instant::now())
    }

    /// Decide whether a change observed at `now` should trigger a sync
    pub fn should_trigger_at(&self, kind: ChangeKind, now: Instant) -> bool {
        if !kind.is_debounced() {
            return true;
        }

        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}
