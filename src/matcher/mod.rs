//! Exclusion matching
//!
//! Patterns are literal substrings, not globs: `"cache/"` excludes any path
//! containing that text anywhere, and `"*.tmp"` only matches paths that
//! literally contain an asterisk.
//!
//! Callers pass the path relative to the replication root, never the absolute
//! path, so a pattern cannot match the directories above the root. A pattern
//! like `"home"` does not exclude everything under `/home/user/src`.

use std::borrow::Cow;
use std::path::Path;

/// Render a path with `/` separators regardless of platform.
pub fn normalize(path: &Path) -> Cow<'_, str> {
    let raw = path.to_string_lossy();
    if raw.contains('\\') {
        Cow::Owned(raw.replace('\\', "/"))
    } else {
        raw
    }
}

/// Check whether `path` contains any of `patterns` after separator normalisation.
pub fn is_excluded<S: AsRef<str>>(path: &Path, patterns: &[S]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let normalized = normalize(path);
    patterns
        .iter()
        .any(|pattern| normalized.contains(pattern.as_ref()))
}
