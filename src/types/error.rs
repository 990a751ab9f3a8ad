//! Error types for frep

use std::path::PathBuf;
use thiserror::Error;

/// Error types for replication operations
#[derive(Debug, Error)]
pub enum ReplicaError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (logic checks on replication pairs)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// The source root of a replication is gone
    #[error("Source path does not exist: {path}")]
    SourceMissing { path: PathBuf },

    /// The destination root could not be created
    #[error("Failed to create destination directory {path}: {source}")]
    DestinationRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The replication store could not be read or written
    #[error("Store error: {0}")]
    Store(String),

    /// Filesystem notification backend failure
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

impl ReplicaError {
    /// Map an IO error on `path` to the most specific variant.
    pub fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            ReplicaError::PermissionDenied {
                path: path.to_path_buf(),
            }
        } else {
            ReplicaError::Io(error)
        }
    }

    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ReplicaError::Validation(_) | ReplicaError::Config(_))
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        matches!(self, ReplicaError::PermissionDenied { .. })
    }

    /// Check if this error aborted a whole replication rather than one file
    pub fn is_root_failure(&self) -> bool {
        matches!(
            self,
            ReplicaError::SourceMissing { .. } | ReplicaError::DestinationRoot { .. }
        )
    }
}
