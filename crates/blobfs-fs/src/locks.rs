use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

/// In-process mutexes keyed by directory path.
///
/// A listing rewrite holds the guard for its parent directory from the read
/// of the old listing until the new one is stored, so two rewrites of the
/// same directory in this process cannot interleave and lose an update.
///
/// This does not coordinate with other processes using the same store. Two
/// processes can still race on one parent: the last rewrite wins and the
/// other change disappears from the listing, while the child entry itself is
/// written or removed correctly.
///
/// Keys are only tracked while held, so the registry does not grow with the
/// number of directories ever touched.
#[derive(Debug, Default)]
pub struct ListingLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl ListingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `key` is free, then take it.
    pub fn lock(&self, key: &str) -> ListingGuard<'_> {
        let mut held = self.held.lock().expect("listing locks poisoned");
        while held.contains(key) {
            held = self.released.wait(held).expect("listing locks poisoned");
        }
        held.insert(key.to_string());
        ListingGuard {
            locks: self,
            key: key.to_string(),
        }
    }

    /// Number of keys currently locked.
    pub fn held_count(&self) -> usize {
        self.held.lock().expect("listing locks poisoned").len()
    }
}

/// Holds one key of a [`ListingLocks`]; released on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ListingGuard<'a> {
    locks: &'a ListingLocks,
    key: String,
}

impl ListingGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for ListingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut held) = self.locks.held.lock() {
            held.remove(&self.key);
        }
        self.locks.released.notify_all();
    }
}
