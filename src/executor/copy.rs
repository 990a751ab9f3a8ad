//! Whole-file copy with metadata

use crate::types::ReplicaError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Suffix of the in-flight temporary file written next to the target
pub const PART_SUFFIX: &str = ".frep-part";

/// Copy `src` over `dest`, preserving permissions and timestamps.
///
/// 1. Stream into a sibling `<name>.frep-part` file and fsync it
/// 2. Copy permissions, access and modification times
/// 3. Rename over the destination
///
/// A directory standing at `dest` is removed first; the source always wins.
/// The parent of `dest` must already exist.
///
/// # Returns
/// * `Ok(u64)` - Number of bytes copied
/// * `Err(ReplicaError)` - IO error or permission failure
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64, ReplicaError> {
    let part_path = part_path_for(dest);

    let result = write_part(src, &part_path).and_then(|bytes| {
        if fs::symlink_metadata(dest).is_ok_and(|m| m.is_dir()) {
            fs::remove_dir_all(dest).map_err(|e| ReplicaError::from_io(dest, e))?;
        }
        fs::rename(&part_path, dest).map_err(|e| ReplicaError::from_io(dest, e))?;
        Ok(bytes)
    });

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn write_part(src: &Path, part_path: &Path) -> Result<u64, ReplicaError> {
    let mut src_file = File::open(src).map_err(|e| ReplicaError::from_io(src, e))?;
    let mut part_file = File::create(part_path).map_err(|e| ReplicaError::from_io(part_path, e))?;

    let total_bytes = io::copy(&mut src_file, &mut part_file)
        .map_err(|e| ReplicaError::from_io(part_path, e))?;
    part_file
        .sync_all()
        .map_err(|e| ReplicaError::from_io(part_path, e))?;
    drop(part_file);

    let src_metadata = src_file
        .metadata()
        .map_err(|e| ReplicaError::from_io(src, e))?;
    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| ReplicaError::from_io(part_path, e))?;

    let atime = filetime::FileTime::from_last_access_time(&src_metadata);
    let mtime = filetime::FileTime::from_last_modification_time(&src_metadata);
    filetime::set_file_times(part_path, atime, mtime)
        .map_err(|e| ReplicaError::from_io(part_path, e))?;

    Ok(total_bytes)
}

fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(PART_SUFFIX);
    dest.with_file_name(name)
}

/// Copy a file, reporting failure instead of propagating it.
///
/// Returns `false` on any IO or permission error; the caller counts it as a
/// per-file failure and carries on with the rest of the tree.
pub fn safe_copy(src: &Path, dest: &Path) -> bool {
    match copy_file(src, dest) {
        Ok(_) => true,
        Err(ReplicaError::PermissionDenied { path }) => {
            warn!(path = %path.display(), "permission denied while copying");
            false
        }
        Err(e) => {
            warn!(src = %src.display(), error = %e, "error copying file");
            false
        }
    }
}

/// Remove a directory tree, treating an already-missing one as success.
pub fn remove_dir_tree(path: &Path) -> Result<(), ReplicaError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReplicaError::from_io(path, e)),
    }
}

/// Remove a file, treating an already-missing one as success.
pub fn remove_file(path: &Path) -> Result<(), ReplicaError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ReplicaError::from_io(path, e)),
    }
}
