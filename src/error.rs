//! Error taxonomy for storage operations.
//!
//! Every failure of the storage engine falls into one of these variants.
//! The HTTP layer maps them to status codes and `{message, error?}` JSON
//! bodies; no operation is ever retried.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The target file does not exist in the storage root.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The target path is a directory, not a file.
    #[error("'{0}' is a directory")]
    IsDirectory(String),

    /// The rename destination already exists.
    #[error("a file named '{0}' already exists")]
    NameCollision(String),

    /// The supplied file name is empty or reduces to no base name.
    #[error("invalid file name: '{0}'")]
    InvalidName(String),

    /// Unexpected read/write/scan error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Short human-readable category, used as the `message` field of
    /// error responses.
    pub fn message(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "File not found",
            StorageError::IsDirectory(_) => "Cannot operate on a directory",
            StorageError::NameCollision(_) => "A file with that name already exists",
            StorageError::InvalidName(_) => "Invalid file name",
            StorageError::Io(_) => "Unexpected IO failure",
        }
    }
}
