//! # LocalDrive
//!
//! Share a single local directory over HTTP: browse, upload, rename,
//! delete and download files from any device on the network.
//!
//! ## Overview
//!
//! LocalDrive exposes one flat directory (the *storage root*) as a
//! remotely browsable, mutable file set:
//!
//! - **Listing**: fresh filesystem scan per request, with substring
//!   filtering and stable multi-field sorting
//! - **Uploads**: collision-safe naming with an incrementing ` (n)`
//!   suffix, upload names sanitized to bare base names
//! - **Mutations**: delete and rename guarded by a shared
//!   existence/not-a-directory precondition
//! - **Downloads**: raw byte streams with attachment headers
//!
//! There is no persistent index, no access control and no recursion into
//! subdirectories; the storage root is treated as shared, externally
//! mutable state.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration with env overrides
//! - [`error`]: the storage error taxonomy
//! - [`storage`]: the directory index and mutation engine
//! - [`http`]: axum routes over the storage engine
//! - [`ui`]: terminal QR code rendering for the server URL

pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod ui;

pub use config::Config;
pub use error::StorageError;
pub use storage::{FileEntry, Listing, Query, SortField, SortOrder, StorageService};
