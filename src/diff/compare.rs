//! File comparison logic

use crate::hash::compute_hash;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Decide whether two files hold the same bytes.
///
/// 1. **Size**: cheap metadata check, different sizes are never identical.
/// 2. **Content**: Blake3 digest of both files, streamed in 64 KiB chunks.
///
/// Fails closed: any IO error (missing file, permission denied, a directory
/// on either side) yields `false`, so the caller attempts a copy and that copy
/// reports its own error.
pub fn files_identical(a: &Path, b: &Path) -> bool {
    let (meta_a, meta_b) = match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => (ma, mb),
        (Err(e), _) | (_, Err(e)) => {
            debug!(a = %a.display(), b = %b.display(), error = %e, "metadata unavailable, treating as different");
            return false;
        }
    };

    if !meta_a.is_file() || !meta_b.is_file() {
        return false;
    }

    if meta_a.len() != meta_b.len() {
        return false;
    }

    match (compute_hash(a), compute_hash(b)) {
        (Ok(ha), Ok(hb)) => ha == hb,
        (Err(e), _) | (_, Err(e)) => {
            debug!(a = %a.display(), b = %b.display(), error = %e, "hashing failed, treating as different");
            false
        }
    }
}
