//! Directory scanning with concurrent metadata fan-out.
//!
//! The scanner enumerates the *direct* children of the storage root and
//! resolves size and timestamps for each regular file. Subdirectories are
//! invisible to the rest of the system, not merely filtered out later.
//!
//! A listing is a best-effort snapshot: a child deleted between the
//! directory read and its metadata fetch is silently omitted. Only a
//! failure to read the root itself is surfaced to the caller.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use serde::{Serialize, Serializer};

use crate::error::StorageError;

/// One non-directory child of the storage root, rebuilt on every scan.
///
/// Carries no identity beyond its `filename`, which is also the operation
/// key for delete, rename and download.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// File name, unique among current directory children.
    pub filename: String,

    /// Absolute path of the file.
    #[serde(rename = "filePath")]
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Creation timestamp. Falls back to the modification time on
    /// platforms without a birth time.
    #[serde(rename = "creationDate", serialize_with = "unix_seconds")]
    pub created: SystemTime,

    /// Last modification timestamp.
    #[serde(rename = "modificationDate", serialize_with = "unix_seconds")]
    pub modified: SystemTime,
}

/// Serialize a [`SystemTime`] as whole seconds since the Unix epoch.
fn unix_seconds<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    serializer.serialize_u64(secs)
}

/// A complete listing response: entries plus the storage root paths.
///
/// `path` is the configured root as given; `real_path` the canonicalized
/// form. Both are for display only, never an operational input.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub path: PathBuf,
    #[serde(rename = "realPath")]
    pub real_path: PathBuf,
}

/// Enumerate the direct children of `root` and resolve metadata for each
/// regular file.
///
/// Metadata fetches are independent and issued concurrently; completion
/// order does not matter because ordering is imposed by the sorter. The
/// returned entries keep the discovery order of the directory read, which
/// is what stable sorting later preserves for ties.
///
/// # Errors
///
/// Fails only when the root directory itself cannot be read. Per-entry
/// errors (raced deletes, permission problems) drop that entry.
pub async fn scan(root: &Path) -> Result<Vec<FileEntry>, StorageError> {
    let mut dir = tokio::fs::read_dir(root).await?;

    let mut children = Vec::new();
    loop {
        match dir.next_entry().await {
            Ok(Some(entry)) => children.push(entry),
            Ok(None) => break,
            // The directory stream itself failed, not one child; the
            // listing cannot be trusted.
            Err(err) => return Err(err.into()),
        }
    }

    let fetches = children.into_iter().map(|entry| async move {
        let filename = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(err) => {
                tracing::debug!(filename, "entry disappeared mid-scan: {err}");
                return None;
            }
        };

        if metadata.is_dir() {
            return None;
        }

        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);

        Some(FileEntry {
            filename,
            path,
            size: metadata.len(),
            created,
            modified,
        })
    });

    // join_all preserves input order, so discovery order survives the
    // concurrent fan-out.
    let entries = join_all(fetches).await.into_iter().flatten().collect();

    Ok(entries)
}
