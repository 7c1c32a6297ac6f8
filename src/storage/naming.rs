//! Upload-name sanitization and collision-safe naming.
//!
//! Client-supplied file names are never trusted: they are reduced to a
//! bare base name before being joined with the storage root, so a crafted
//! name cannot select a write location outside the root.
//!
//! Collision handling differs by operation on purpose: uploads get a
//! disambiguating ` (n)` suffix, renames are rejected outright.

use std::collections::HashSet;
use std::path::Path;

use crate::error::StorageError;

/// Reduce a client-supplied name to its final path segment.
///
/// Forward and backward slashes are both treated as separators since the
/// name may come from any client platform. Empty names, `.` and `..` are
/// rejected.
///
/// # Errors
///
/// Returns [`StorageError::InvalidName`] when no usable base name remains.
pub fn sanitize_file_name(original: &str) -> Result<String, StorageError> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original)
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(StorageError::InvalidName(original.to_string()));
    }

    Ok(base.to_string())
}

/// Find a free name for `desired` against the given set of taken names.
///
/// If the name is free it is returned unchanged; otherwise a ` (n)`
/// suffix is inserted before the extension, trying n = 1, 2, 3, ... until
/// a free name is found. The check-then-use sequence is not atomic with
/// the eventual write; callers handle the create race themselves.
pub fn resolve_collision(desired: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(desired) {
        return desired.to_string();
    }

    let path = Path::new(desired);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| desired.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1u32;
    loop {
        let candidate = match &extension {
            Some(ext) => format!("{stem} ({counter}).{ext}"),
            None => format!("{stem} ({counter})"),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
