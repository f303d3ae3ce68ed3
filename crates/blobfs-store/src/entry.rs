use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::stream::EntryWriter;
use crate::traits::PathStore;

/// Metadata attached to every stored entry.
///
/// Field names follow the blob store's document layout, so a persisted
/// record reads `isDirectory` / `uploadDate`. A missing `isDirectory` flag
/// means the entry is a plain file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Whether the entry is a synthetic directory whose payload is a listing.
    #[serde(rename = "isDirectory", default)]
    pub is_directory: bool,
    /// When the backend finalized the entry. Set by the store on insert.
    #[serde(rename = "uploadDate", default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// One stored record: a full path key, a byte payload and its metadata.
///
/// For a plain file the payload is the file contents. For a directory it is
/// the newline-delimited listing of child names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Canonical absolute path, e.g. `/a/b/c`. Unique per entry.
    pub key: String,
    pub metadata: EntryMetadata,
    pub payload: Vec<u8>,
}

impl PathEntry {
    /// Create a plain file entry.
    pub fn new(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            metadata: EntryMetadata::default(),
            payload,
        }
    }

    /// Create a directory entry with the given listing payload.
    pub fn directory(key: impl Into<String>, listing: Vec<u8>) -> Self {
        let mut entry = Self::new(key, listing);
        entry.metadata.is_directory = true;
        entry
    }

    /// Byte length of the payload.
    pub fn len(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn is_directory(&self) -> bool {
        self.metadata.is_directory
    }
}

/// A freshly allocated entry that has not been stored yet.
///
/// Obtained from [`PathStore::create_empty`]. The caller adjusts metadata and
/// then either saves it directly or turns it into an [`EntryWriter`] to
/// stream the payload first. Nothing reaches the store until one of those
/// paths finalizes it.
#[derive(Clone, Debug)]
#[must_use = "a pending entry is not stored until it is saved or written"]
pub struct PendingEntry {
    entry: PathEntry,
}

impl PendingEntry {
    /// Allocate an empty file entry at `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            entry: PathEntry::new(key, Vec::new()),
        }
    }

    pub fn key(&self) -> &str {
        &self.entry.key
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.entry.metadata
    }

    /// Flag the entry as a directory.
    pub fn mark_directory(mut self) -> Self {
        self.entry.metadata.is_directory = true;
        self
    }

    /// Finalize the entry as-is (empty payload).
    pub fn save(self, store: &dyn PathStore) -> StoreResult<()> {
        store.insert(self.entry)
    }

    /// Stream the payload through a writer; the entry is finalized when the
    /// writer is closed.
    pub fn into_writer(self, store: Arc<dyn PathStore>) -> EntryWriter {
        EntryWriter::new(store, self.entry)
    }
}
