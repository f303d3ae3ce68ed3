use std::io::{Cursor, Read};

use crate::entry::{PathEntry, PendingEntry};
use crate::error::StoreResult;

/// Flat key-value access to [`PathEntry`] records.
///
/// All implementations must satisfy these invariants:
/// - Lookups are by exact key. There is no prefix scan and no notion of a
///   parent or child.
/// - There is no update-in-place. `insert` finalizes a new entry; replacing
///   one is the caller's `remove` followed by `insert`.
/// - At most one entry is visible per key. When `insert` meets an entry the
///   caller failed to remove, the newer entry wins.
/// - Backend failures are returned, never retried or silently ignored.
pub trait PathStore: Send + Sync {
    /// Look up the entry stored at `key`.
    ///
    /// Returns `Ok(None)` if there is none.
    fn find(&self, key: &str) -> StoreResult<Option<PathEntry>>;

    /// Finalize an entry.
    ///
    /// Backends stamp [`EntryMetadata::uploaded_at`](crate::EntryMetadata)
    /// with the current time.
    fn insert(&self, entry: PathEntry) -> StoreResult<()>;

    /// Delete the entry at `key`. Returns `true` if one existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Short human-readable label for logs and error messages.
    fn describe(&self) -> String;

    /// Allocate an empty, unsaved entry at `key`.
    fn create_empty(&self, key: &str) -> PendingEntry {
        PendingEntry::new(key)
    }

    /// Open a forward-only reader over the entry's payload.
    fn open_read(&self, entry: &PathEntry) -> StoreResult<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(entry.payload.clone())))
    }

    /// Release backend resources. The default does nothing.
    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
