//! Storage engine: directory index and mutation operations.
//!
//! [`StorageService`] exposes one flat directory as a mutable file set.
//! Listings are fresh filesystem scans (no cache, no persistent index),
//! mutations are single atomic filesystem calls guarded by a shared
//! precondition gate.
//!
//! The storage root is shared, externally mutable state: other processes
//! may add or remove files at any time. Nothing here locks across
//! requests; races resolve to whichever filesystem call lands first, and
//! the loser observes a normal `NotFound` or collision error.

pub mod naming;
pub mod query;
pub mod scanner;

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::StorageError;

pub use query::{Query, SortField, SortOrder};
pub use scanner::{FileEntry, Listing};

/// Orchestrates scanning, filtering, sorting and mutations over one
/// storage root.
///
/// The root is injected at construction; there is no process-wide path
/// state. `root` keeps the configured spelling for display, `real_root`
/// the canonicalized path every operation joins against.
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
    real_root: PathBuf,
}

impl StorageService {
    /// Open a storage root, creating the directory if it does not exist.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        let real_root = tokio::fs::canonicalize(&root).await?;
        Ok(Self { root, real_root })
    }

    /// The canonicalized storage root.
    pub fn root(&self) -> &Path {
        &self.real_root
    }

    /// Shared precondition for delete, rename, download and single-entry
    /// reads: the filename must resolve to an existing non-directory
    /// inside the storage root.
    ///
    /// The name is sanitized to a bare base name first, so traversal
    /// segments in the operation key cannot escape the root.
    async fn gate(
        &self,
        filename: &str,
    ) -> Result<(String, PathBuf, std::fs::Metadata), StorageError> {
        let name = naming::sanitize_file_name(filename)?;
        let path = self.real_root.join(&name);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name));
            }
            Err(err) => return Err(err.into()),
        };

        if metadata.is_dir() {
            return Err(StorageError::IsDirectory(name));
        }

        Ok((name, path, metadata))
    }

    /// List the storage root: scan, filter, sort.
    ///
    /// Never partially fails; entries whose metadata cannot be read are
    /// dropped from the snapshot.
    pub async fn list(&self, query: &Query) -> Result<Listing, StorageError> {
        let entries = scanner::scan(&self.real_root).await?;
        let mut files = query::filter(entries, query.search.as_deref());
        query::sort(&mut files, query.sort, query.order);

        tracing::debug!(
            count = files.len(),
            sort = ?query.sort,
            order = ?query.order,
            "listed storage root"
        );

        Ok(Listing {
            files,
            path: self.root.clone(),
            real_path: self.real_root.clone(),
        })
    }

    /// Fetch a single entry together with its content.
    pub async fn read(&self, filename: &str) -> Result<(FileEntry, Vec<u8>), StorageError> {
        let (name, path, metadata) = self.gate(filename).await?;

        let content = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name));
            }
            Err(err) => return Err(err.into()),
        };

        let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
        let entry = FileEntry {
            filename: name,
            path,
            size: metadata.len(),
            created: metadata.created().unwrap_or(modified),
            modified,
        };

        Ok((entry, content))
    }

    /// Delete a file. Irreversible; there is no trash.
    pub async fn delete(&self, filename: &str) -> Result<(), StorageError> {
        let (name, path, _) = self.gate(filename).await?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %name, "deleted file");
                Ok(())
            }
            // Raced with a concurrent delete; report it like any other miss.
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Rename a file within the storage root.
    ///
    /// A blank or identical new name is a silent no-op. An existing
    /// destination is rejected with [`StorageError::NameCollision`] -
    /// renames never disambiguate, unlike uploads.
    pub async fn rename(&self, filename: &str, new_filename: &str) -> Result<(), StorageError> {
        let new_filename = new_filename.trim();
        if new_filename.is_empty() || new_filename == filename {
            return Ok(());
        }

        let (name, source, _) = self.gate(filename).await?;
        let new_name = naming::sanitize_file_name(new_filename)?;
        if new_name == name {
            return Ok(());
        }

        let destination = self.real_root.join(&new_name);
        if tokio::fs::try_exists(&destination).await? {
            return Err(StorageError::NameCollision(new_name));
        }

        tokio::fs::rename(&source, &destination).await?;
        tracing::info!(from = %name, to = %new_name, "renamed file");
        Ok(())
    }

    /// Open a file for downloading.
    ///
    /// Returns the sanitized filename, the size, and an open handle the
    /// caller streams from.
    pub async fn download(
        &self,
        filename: &str,
    ) -> Result<(String, u64, tokio::fs::File), StorageError> {
        let (name, path, metadata) = self.gate(filename).await?;

        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name));
            }
            Err(err) => return Err(err.into()),
        };

        Ok((name, metadata.len(), file))
    }

    /// Store uploaded bytes under a collision-free name derived from
    /// `original_name`, returning the name actually used.
    ///
    /// The name set is read fresh on every attempt, so files later in a
    /// multi-file batch observe the names written by earlier ones. The
    /// write uses exclusive create; losing a create race re-resolves
    /// instead of silently overwriting.
    pub async fn upload(&self, original_name: &str, data: &[u8]) -> Result<String, StorageError> {
        let desired = naming::sanitize_file_name(original_name)?;

        loop {
            let taken = self.taken_names().await?;
            let candidate = naming::resolve_collision(&desired, &taken);
            let path = self.real_root.join(&candidate);

            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match open {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    tracing::info!(
                        filename = %candidate,
                        size = data.len(),
                        "stored uploaded file"
                    );
                    return Ok(candidate);
                }
                // A concurrent upload claimed the name between the scan
                // and the create; pick again.
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Every child name currently in the root, directories included: a
    /// directory with the desired name blocks an upload just as a file
    /// does.
    async fn taken_names(&self) -> Result<HashSet<String>, StorageError> {
        let mut dir = tokio::fs::read_dir(&self.real_root).await?;
        let mut names = HashSet::new();
        while let Ok(Some(entry)) = dir.next_entry().await {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}
