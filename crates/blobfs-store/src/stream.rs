//! Write streams that finalize an entry on close.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::debug;

use crate::entry::PathEntry;
use crate::error::StoreResult;
use crate::traits::PathStore;

/// Open a write stream that stores a new entry at `key` once closed.
///
/// Any existing entry at `key` is left alone; callers remove it first.
pub fn open_write(store: Arc<dyn PathStore>, key: &str) -> EntryWriter {
    store.create_empty(key).into_writer(Arc::clone(&store))
}

/// Sequential writer for an entry payload.
///
/// Bytes are buffered until [`EntryWriter::close`] hands the finished entry
/// to the store. Dropping the writer without closing it abandons the entry:
/// nothing is stored.
#[must_use = "an entry writer stores nothing until it is closed"]
pub struct EntryWriter {
    store: Arc<dyn PathStore>,
    entry: Option<PathEntry>,
}

impl EntryWriter {
    pub(crate) fn new(store: Arc<dyn PathStore>, entry: PathEntry) -> Self {
        Self {
            store,
            entry: Some(entry),
        }
    }

    /// Key the entry will be stored under.
    pub fn key(&self) -> &str {
        self.entry.as_ref().map(|e| e.key.as_str()).unwrap_or_default()
    }

    /// Number of payload bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.entry.as_ref().map(PathEntry::len).unwrap_or(0)
    }

    /// Finalize the entry in the store.
    pub fn close(mut self) -> StoreResult<()> {
        match self.entry.take() {
            Some(entry) => self.store.insert(entry),
            None => Ok(()),
        }
    }
}

impl Write for EntryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let entry = self
            .entry
            .as_mut()
            .ok_or_else(|| io::Error::other("entry writer already closed"))?;
        entry.payload.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EntryWriter {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            debug!(key = %entry.key, bytes = entry.len(), "abandoning unclosed entry writer");
        }
    }
}

impl std::fmt::Debug for EntryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryWriter")
            .field("store", &self.store.describe())
            .field("key", &self.key())
            .field("bytes_written", &self.bytes_written())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPathStore;

    fn store() -> (Arc<InMemoryPathStore>, Arc<dyn PathStore>) {
        let concrete = Arc::new(InMemoryPathStore::new());
        let dynamic: Arc<dyn PathStore> = concrete.clone();
        (concrete, dynamic)
    }

    #[test]
    fn close_finalizes_entry() {
        let (mem, store) = store();
        let mut writer = open_write(store, "/f");
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(writer.bytes_written(), 11);
        assert!(mem.is_empty());

        writer.close().unwrap();
        let entry = mem.find("/f").unwrap().expect("entry after close");
        assert_eq!(entry.payload, b"hello world");
        assert!(!entry.is_directory());
    }

    #[test]
    fn dropped_writer_stores_nothing() {
        let (mem, store) = store();
        {
            let mut writer = open_write(store, "/abandoned");
            writer.write_all(b"lost").unwrap();
        }
        assert!(mem.find("/abandoned").unwrap().is_none());
    }

    #[test]
    fn pending_directory_keeps_flag_through_writer() {
        let (mem, store) = store();
        let mut writer = store.create_empty("/d").mark_directory().into_writer(store.clone());
        writer.write_all(b"a\n").unwrap();
        writer.close().unwrap();

        let entry = mem.find("/d").unwrap().unwrap();
        assert!(entry.is_directory());
        assert_eq!(entry.payload, b"a\n");
    }

    #[test]
    fn debug_names_key() {
        let (_, store) = store();
        let writer = open_write(store, "/dbg");
        let debug = format!("{writer:?}");
        assert!(debug.contains("/dbg"));
    }
}
