use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::warn;

use crate::entry::PathEntry;
use crate::error::StoreResult;
use crate::traits::PathStore;

/// In-memory, HashMap-based path store.
///
/// Intended for tests and embedding. All entries are held in memory behind a
/// `RwLock` for safe concurrent access. Entries are cloned on read/write.
pub struct InMemoryPathStore {
    entries: RwLock<HashMap<String, PathEntry>>,
}

impl InMemoryPathStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Total payload bytes across all stored entries.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .expect("lock poisoned")
            .values()
            .map(PathEntry::len)
            .sum()
    }

    /// Remove all entries from the store.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryPathStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PathStore for InMemoryPathStore {
    fn find(&self, key: &str) -> StoreResult<Option<PathEntry>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn insert(&self, mut entry: PathEntry) -> StoreResult<()> {
        entry.metadata.uploaded_at = Some(Utc::now());
        let mut map = self.entries.write().expect("lock poisoned");
        if let Some(stale) = map.insert(entry.key.clone(), entry) {
            warn!(key = %stale.key, "insert displaced an entry that was not removed first");
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        let mut map = self.entries.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

impl std::fmt::Debug for InMemoryPathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryPathStore")
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn file(key: &str, content: &[u8]) -> PathEntry {
        PathEntry::new(key, content.to_vec())
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_find_file() {
        let store = InMemoryPathStore::new();
        store.insert(file("/a", b"hello world")).unwrap();

        let read_back = store.find("/a").unwrap().expect("should exist");
        assert_eq!(read_back.payload, b"hello world");
        assert!(!read_back.is_directory());
        assert!(read_back.metadata.uploaded_at.is_some());
    }

    #[test]
    fn find_missing_returns_none() {
        let store = InMemoryPathStore::new();
        assert!(store.find("/missing").unwrap().is_none());
    }

    #[test]
    fn lookup_is_exact_key() {
        let store = InMemoryPathStore::new();
        store.insert(file("/a/b", b"x")).unwrap();
        assert!(store.find("/a").unwrap().is_none());
        assert!(store.find("/a/b/").unwrap().is_none());
    }

    #[test]
    fn remove_present_entry() {
        let store = InMemoryPathStore::new();
        store.insert(file("/gone", b"bye")).unwrap();
        assert!(store.remove("/gone").unwrap()); // was present
        assert!(store.find("/gone").unwrap().is_none()); // now gone
        assert!(!store.remove("/gone").unwrap()); // second remove = false
    }

    #[test]
    fn remove_missing_is_noop() {
        let store = InMemoryPathStore::new();
        assert!(!store.remove("/never-written").unwrap());
    }

    // -----------------------------------------------------------------------
    // Replace semantics
    // -----------------------------------------------------------------------

    #[test]
    fn remove_then_insert_replaces() {
        let store = InMemoryPathStore::new();
        store.insert(file("/f", b"v1")).unwrap();
        store.remove("/f").unwrap();
        store.insert(file("/f", b"v2")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find("/f").unwrap().unwrap().payload, b"v2");
    }

    #[test]
    fn insert_over_stale_entry_keeps_one() {
        let store = InMemoryPathStore::new();
        store.insert(file("/f", b"old")).unwrap();
        store.insert(file("/f", b"new")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find("/f").unwrap().unwrap().payload, b"new");
    }

    // -----------------------------------------------------------------------
    // Streams
    // -----------------------------------------------------------------------

    #[test]
    fn open_read_yields_payload() {
        let store = InMemoryPathStore::new();
        store.insert(file("/bin", &[0x00, 0xff, 0x41])).unwrap();
        let entry = store.find("/bin").unwrap().unwrap();

        let mut buf = Vec::new();
        store.open_read(&entry).unwrap().read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![0x00, 0xff, 0x41]);
    }

    #[test]
    fn create_empty_then_save() {
        let store = InMemoryPathStore::new();
        store.create_empty("/dir").mark_directory().save(&store).unwrap();

        let entry = store.find("/dir").unwrap().unwrap();
        assert!(entry.is_directory());
        assert_eq!(entry.len(), 0);
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_and_is_empty() {
        let store = InMemoryPathStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);

        store.insert(file("/a", b"a")).unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn total_bytes() {
        let store = InMemoryPathStore::new();
        store.insert(file("/five", b"12345")).unwrap();
        store.insert(file("/nine", b"123456789")).unwrap();
        assert_eq!(store.total_bytes(), 14);
    }

    #[test]
    fn clear_removes_all() {
        let store = InMemoryPathStore::new();
        store.insert(file("/a", b"a")).unwrap();
        store.insert(file("/b", b"b")).unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryPathStore::new();
        store.insert(file("/c", b"")).unwrap();
        store.insert(file("/a", b"")).unwrap();
        store.insert(file("/b", b"")).unwrap();
        assert_eq!(store.keys(), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryPathStore::new());
        store.insert(file("/shared", b"shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let entry = store.find("/shared").unwrap().expect("present");
                    assert_eq!(entry.payload, b"shared data");
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryPathStore::new();
        store.insert(file("/x", b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryPathStore"));
        assert!(debug.contains("entry_count"));
    }
}
