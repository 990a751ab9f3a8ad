//! Configuration management

pub mod cli;
pub mod store;

pub use cli::{Cli, Command};
pub use store::{FileStore, MemoryStore, ReplicationStore, StoreDocument};

use crate::types::ReplicaError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine settings kept in the `[settings]` table of the store file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes between periodic full syncs in watch mode
    pub sync_interval_minutes: u64,

    /// Minimum gap between accepted modification-triggered syncs (milliseconds)
    pub debounce_ms: u64,

    /// Serialise concurrent syncs of the same replication
    pub serialize_syncs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_interval_minutes: 60,
            debounce_ms: 2000,
            serialize_syncs: true,
        }
    }
}

/// Longest accepted periodic sync interval (one day)
pub const MAX_SYNC_INTERVAL_MINUTES: u64 = 24 * 60;

/// Convert a periodic sync interval in minutes to a `Duration`.
///
/// # Errors
/// `Config` unless `1 <= minutes <= MAX_SYNC_INTERVAL_MINUTES`.
pub fn interval_from_minutes(minutes: u64) -> Result<Duration, ReplicaError> {
    if minutes == 0 {
        return Err(ReplicaError::Config(
            "sync interval must be at least 1 minute".to_string(),
        ));
    }
    if minutes > MAX_SYNC_INTERVAL_MINUTES {
        return Err(ReplicaError::Config(format!(
            "sync interval must be at most {} minutes, got {}",
            MAX_SYNC_INTERVAL_MINUTES, minutes
        )));
    }
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ReplicaError::Config(format!("sync interval {} minutes overflows", minutes)))
}

impl Settings {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ReplicaError> {
        self.sync_interval().map(|_| ())
    }

    pub fn sync_interval(&self) -> Result<Duration, ReplicaError> {
        interval_from_minutes(self.sync_interval_minutes)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
