//! Replication - a configured source → destination pair

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A source directory mirrored into a destination directory.
///
/// The source path is the identity key: the store guarantees it is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Replication {
    /// Directory whose contents are authoritative
    pub source: PathBuf,

    /// Directory kept identical to `source`
    pub destination: PathBuf,

    /// Literal substrings; any path containing one is left alone
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Completion time of the last sync that reached the end of both passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl Replication {
    /// Create a replication that has never been synced
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            exclusions: Vec::new(),
            last_sync: None,
        }
    }

    /// Attach exclusion patterns
    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    /// Identity used by the store for lookups
    pub fn identity(&self) -> &Path {
        &self.source
    }
}
