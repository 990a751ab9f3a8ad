//! # frep - folder replicator
//!
//! One-way mirroring of source folders into destination folders.
//!
//! A sync runs in two passes: the source tree is walked and every new or
//! changed file is copied, then destination entries with no source
//! counterpart are deleted. Exclusion patterns are literal substrings of the
//! path relative to the replication root, and apply to both passes. Watch
//! mode adds change-triggered syncs and a periodic full sync.

// Module declarations
pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod hash;
pub mod matcher;
pub mod types;
pub mod ui;
pub mod watch;

// Re-export commonly used types
pub use config::{FileStore, MemoryStore, ReplicationStore, Settings};
pub use diff::{DiffEngine, SyncPlan};
pub use executor::{SyncEvent, Synchronizer};
pub use types::{ReplicaError, Replication, StatusReport, SyncAction, SyncStats};
pub use watch::{ChangeWatcher, PeriodicScheduler, WatchService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
