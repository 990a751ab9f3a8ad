//! Content fingerprints

use crate::types::ReplicaError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read granularity when fingerprinting; bounds memory per file.
pub const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// 32-byte Blake3 digest
pub type Digest = [u8; 32];

/// Fingerprint everything readable from `reader`.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<Digest> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(*hasher.finalize().as_bytes())
}

/// Compute the Blake3 digest of a file, streamed in 64 KiB chunks.
///
/// # Example
/// ```no_run
/// use frep::hash::compute_hash;
/// use std::path::Path;
///
/// let digest = compute_hash(Path::new("file.txt"))?;
/// # Ok::<(), frep::ReplicaError>(())
/// ```
pub fn compute_hash(file_path: &Path) -> Result<Digest, ReplicaError> {
    let file = File::open(file_path).map_err(|e| ReplicaError::from_io(file_path, e))?;
    hash_reader(file).map_err(|e| ReplicaError::from_io(file_path, e))
}
