use blobfs_store::PathEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an info query reports about one path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Last path segment; empty for the root.
    pub name: String,
    pub exists: bool,
    pub is_directory: bool,
    /// Payload length in bytes. For a directory, the size of its listing.
    pub length: u64,
    /// When the entry was last stored, if the backend recorded it.
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    /// Info for a path with no entry.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exists: false,
            is_directory: false,
            length: 0,
            last_modified: None,
        }
    }

    /// Info describing a stored entry.
    pub fn from_entry(name: impl Into<String>, entry: &PathEntry) -> Self {
        Self {
            name: name.into(),
            exists: true,
            is_directory: entry.is_directory(),
            length: entry.len(),
            last_modified: entry.metadata.uploaded_at,
        }
    }
}
