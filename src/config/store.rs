//! Replication store
//!
//! The sync engine only needs to list replications and record when each one
//! last completed. [`FileStore`] keeps them in a TOML file next to the
//! [`Settings`]; [`MemoryStore`] keeps them in-process.

use super::Settings;
use crate::types::{ReplicaError, Replication};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Environment variable overriding the default store location
pub const CONFIG_ENV: &str = "FREP_CONFIG";

/// Source of replication pairs for the engine.
///
/// Identity is the source path.
pub trait ReplicationStore: Send + Sync {
    /// All configured replications, in insertion order
    fn get_replications(&self) -> Vec<Replication>;

    /// Record the completion time of a sync for the replication rooted at `source`
    fn update_last_sync(&self, source: &Path, timestamp: DateTime<Utc>) -> Result<(), ReplicaError>;
}

/// On-disk layout of the store file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreDocument {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub replications: Vec<Replication>,
}

/// TOML-backed store.
///
/// Every mutation rewrites the file through a temporary sibling and a rename,
/// while holding the document lock, so concurrent writers cannot interleave.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl FileStore {
    /// Open the store at `path`; a missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ReplicaError> {
        let path = path.into();
        let document = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|e| {
                ReplicaError::Config(format!("Invalid store file {}: {}", path.display(), e))
            })?
        } else {
            debug!(path = %path.display(), "store file missing, starting empty");
            StoreDocument::default()
        };
        document.settings.validate()?;

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Default location: `$FREP_CONFIG`, else `<config dir>/frep/replicator.toml`
    pub fn default_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .map(|dir| dir.join("frep"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("replicator.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current settings
    pub fn settings(&self) -> Settings {
        self.lock().settings.clone()
    }

    /// Register a new replication pair and persist it.
    ///
    /// Paths are made absolute. The source must exist and must not already be
    /// registered; the pair must not reverse an existing pair, and neither root
    /// may contain the other.
    pub fn add_replication(
        &self,
        source: &Path,
        destination: &Path,
        exclusions: Vec<String>,
    ) -> Result<Replication, ReplicaError> {
        if !source.is_dir() {
            return Err(ReplicaError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        if exclusions.iter().any(|p| p.is_empty()) {
            return Err(ReplicaError::Validation(
                "Exclusion patterns cannot be empty".to_string(),
            ));
        }

        let source = absolutize(source)?;
        let destination = absolutize(destination)?;

        if source == destination {
            return Err(ReplicaError::Validation(
                "Source and destination cannot be the same".to_string(),
            ));
        }
        if destination.starts_with(&source) || source.starts_with(&destination) {
            return Err(ReplicaError::Validation(format!(
                "Source {} and destination {} cannot be nested",
                source.display(),
                destination.display()
            )));
        }

        let mut doc = self.lock();
        for existing in &doc.replications {
            if existing.source == source {
                return Err(ReplicaError::Validation(format!(
                    "Replication for {} already exists",
                    source.display()
                )));
            }
            if existing.source == destination && existing.destination == source {
                return Err(ReplicaError::Validation(format!(
                    "Replication {} -> {} would reverse an existing pair",
                    source.display(),
                    destination.display()
                )));
            }
        }

        let replication = Replication::new(source, destination).with_exclusions(exclusions);
        doc.replications.push(replication.clone());
        self.persist(&doc)?;
        Ok(replication)
    }

    /// Remove the replication rooted at `source` and persist the change.
    pub fn remove_replication(&self, source: &Path) -> Result<Replication, ReplicaError> {
        let source = absolutize(source)?;
        let mut doc = self.lock();
        let index = doc
            .replications
            .iter()
            .position(|r| r.identity() == source)
            .ok_or_else(|| {
                ReplicaError::Store(format!("No replication for {}", source.display()))
            })?;
        let removed = doc.replications.remove(index);
        self.persist(&doc)?;
        Ok(removed)
    }

    /// Look up the replication rooted at `source`.
    pub fn find(&self, source: &Path) -> Result<Replication, ReplicaError> {
        let source = absolutize(source)?;
        self.lock()
            .replications
            .iter()
            .find(|r| r.identity() == source)
            .cloned()
            .ok_or_else(|| ReplicaError::Store(format!("No replication for {}", source.display())))
    }

    fn lock(&self) -> MutexGuard<'_, StoreDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, doc: &StoreDocument) -> Result<(), ReplicaError> {
        let rendered = toml::to_string_pretty(doc)
            .map_err(|e| ReplicaError::Store(format!("Failed to encode store: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, rendered)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ReplicationStore for FileStore {
    fn get_replications(&self) -> Vec<Replication> {
        self.lock().replications.clone()
    }

    fn update_last_sync(&self, source: &Path, timestamp: DateTime<Utc>) -> Result<(), ReplicaError> {
        let mut doc = self.lock();
        let replication = doc
            .replications
            .iter_mut()
            .find(|r| r.identity() == source)
            .ok_or_else(|| {
                ReplicaError::Store(format!("No replication for {}", source.display()))
            })?;
        replication.last_sync = Some(timestamp);
        self.persist(&doc)
    }
}

/// In-process store for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    replications: Mutex<Vec<Replication>>,
}

impl MemoryStore {
    pub fn new(replications: Vec<Replication>) -> Self {
        Self {
            replications: Mutex::new(replications),
        }
    }
}

impl ReplicationStore for MemoryStore {
    fn get_replications(&self) -> Vec<Replication> {
        self.replications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_last_sync(&self, source: &Path, timestamp: DateTime<Utc>) -> Result<(), ReplicaError> {
        let mut reps = self.replications.lock().unwrap_or_else(PoisonError::into_inner);
        match reps.iter_mut().find(|r| r.identity() == source) {
            Some(r) => {
                r.last_sync = Some(timestamp);
                Ok(())
            }
            None => Err(ReplicaError::Store(format!(
                "No replication for {}",
                source.display()
            ))),
        }
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ReplicaError> {
    if path.exists() {
        Ok(path.canonicalize()?)
    } else {
        Ok(std::path::absolute(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_updates_by_source() {
        let store = MemoryStore::new(vec![
            Replication::new("/a", "/b"),
            Replication::new("/c", "/d"),
        ]);
        let now = Utc::now();
        store.update_last_sync(Path::new("/c"), now).unwrap();

        let reps = store.get_replications();
        assert_eq!(reps[0].last_sync, None);
        assert_eq!(reps[1].last_sync, Some(now));
        assert!(store.update_last_sync(Path::new("/zzz"), now).is_err());
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("none.toml")).unwrap();
        assert!(store.get_replications().is_empty());
        assert_eq!(store.settings(), Settings::default());
    }

    #[test]
    fn test_rejects_nested_destination() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.toml")).unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();

        let err = store
            .add_replication(&src, &src.join("backup"), vec![])
            .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_rejects_empty_pattern() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.toml")).unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();

        let err = store
            .add_replication(&src, &dir.path().join("dst"), vec![String::new()])
            .unwrap_err();
        assert!(err.is_validation_error());
    }
}
