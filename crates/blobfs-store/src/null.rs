use crate::entry::PathEntry;
use crate::error::StoreResult;
use crate::traits::PathStore;

/// A store that holds nothing.
///
/// Lookups never find an entry and writes are discarded. It stands in for a
/// store that could not be resolved, so callers always get a working handle
/// instead of a connection error.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPathStore;

impl PathStore for NullPathStore {
    fn find(&self, _key: &str) -> StoreResult<Option<PathEntry>> {
        Ok(None)
    }

    fn insert(&self, _entry: PathEntry) -> StoreResult<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> StoreResult<bool> {
        Ok(false)
    }

    fn describe(&self) -> String {
        "null".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_discarded() {
        let store = NullPathStore;
        store.insert(PathEntry::new("/a", b"data".to_vec())).unwrap();
        assert!(store.find("/a").unwrap().is_none());
        assert!(!store.remove("/a").unwrap());
    }

    #[test]
    fn close_succeeds() {
        assert!(NullPathStore.close().is_ok());
    }
}
