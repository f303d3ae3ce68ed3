//! Error types for filesystem operations.

use blobfs_store::StoreError;
use thiserror::Error;

use crate::path::FsPath;

/// Errors that can occur during filesystem operations.
///
/// Every variant names the path the operation was bound to.
#[derive(Debug, Error)]
pub enum FsError {
    /// The path has no entry.
    #[error("path '{path}' does not exist")]
    NotFound { path: FsPath },

    /// The operation needs a file but the path is a directory.
    #[error("path '{path}' is a directory")]
    IsDirectory { path: FsPath },

    /// A directory was requested where a file already exists.
    #[error("cannot create directory '{path}': a file with this path already exists")]
    AlreadyExistsAsFile { path: FsPath },

    /// The parent directory does not exist.
    #[error("cannot create '{path}': parent directory does not exist")]
    ParentMissing { path: FsPath },

    /// The parent path is a file.
    #[error("cannot create '{path}': parent is not a directory")]
    ParentNotDirectory { path: FsPath },

    /// The last path segment cannot be stored in a directory listing.
    #[error("invalid name in '{path}': names may not contain line breaks")]
    InvalidName { path: FsPath },

    /// The underlying store could not be reached or failed on I/O.
    #[error("store unavailable while accessing '{path}': {source}")]
    StoreUnavailable {
        path: FsPath,
        #[source]
        source: StoreError,
    },

    /// The stored entry exists but cannot be decoded.
    #[error("corrupt entry at '{path}': {source}")]
    CorruptEntry {
        path: FsPath,
        #[source]
        source: StoreError,
    },
}

impl FsError {
    /// The path the failed operation was bound to.
    pub fn path(&self) -> &FsPath {
        match self {
            Self::NotFound { path }
            | Self::IsDirectory { path }
            | Self::AlreadyExistsAsFile { path }
            | Self::ParentMissing { path }
            | Self::ParentNotDirectory { path }
            | Self::InvalidName { path }
            | Self::StoreUnavailable { path, .. }
            | Self::CorruptEntry { path, .. } => path,
        }
    }
}

/// Convenience alias for filesystem results.
pub type FsResult<T> = Result<T, FsError>;
