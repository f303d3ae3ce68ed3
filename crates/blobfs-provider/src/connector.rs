use std::path::{Path, PathBuf};
use std::sync::Arc;

use blobfs_store::{DirectoryPathStore, InMemoryPathStore, PathStore, StoreError, StoreResult};
use tracing::debug;

use crate::endpoint::Endpoint;

/// Opens a store connection for an endpoint.
///
/// Connectors do not cache; the [`StoreRegistry`](crate::StoreRegistry)
/// decides when to call them. An endpoint that cannot be reached is reported
/// as [`StoreError::Unavailable`].
pub trait StoreConnector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> StoreResult<Arc<dyn PathStore>>;
}

/// Connects every endpoint to a fresh in-memory store.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryConnector;

impl StoreConnector for MemoryConnector {
    fn connect(&self, endpoint: &Endpoint) -> StoreResult<Arc<dyn PathStore>> {
        debug!(%endpoint, "connecting in-memory store");
        Ok(Arc::new(InMemoryPathStore::new()))
    }
}

/// Connects each endpoint to a [`DirectoryPathStore`] in its own
/// subdirectory `<root>/<host>_<port>`.
#[derive(Clone, Debug)]
pub struct DirectoryConnector {
    root: PathBuf,
}

impl DirectoryConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the records of `endpoint`.
    ///
    /// Characters outside `[A-Za-z0-9.-]` in the host become `_`, so IPv6
    /// literals and odd host names still map to a single path component.
    pub fn store_dir(&self, endpoint: &Endpoint) -> PathBuf {
        let host: String = endpoint
            .host
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{host}_{}", endpoint.port))
    }
}

impl StoreConnector for DirectoryConnector {
    fn connect(&self, endpoint: &Endpoint) -> StoreResult<Arc<dyn PathStore>> {
        if endpoint.host.is_empty() {
            return Err(StoreError::unavailable(endpoint.to_string(), "empty host"));
        }
        let dir = self.store_dir(endpoint);
        debug!(%endpoint, dir = %dir.display(), "connecting directory store");
        let store = DirectoryPathStore::open(&dir)
            .map_err(|e| StoreError::unavailable(endpoint.to_string(), e.to_string()))?;
        Ok(Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_connections_are_independent() {
        let endpoint = Endpoint::new("localhost", 1);
        let a = MemoryConnector.connect(&endpoint).unwrap();
        let b = MemoryConnector.connect(&endpoint).unwrap();
        a.insert(blobfs_store::PathEntry::new("/k", b"v".to_vec())).unwrap();
        assert!(b.find("/k").unwrap().is_none());
        assert_eq!(a.describe(), "memory");
    }

    #[test]
    fn directory_layout_per_endpoint() {
        let tmp = tempfile::tempdir().unwrap();
        let connector = DirectoryConnector::new(tmp.path());
        assert_eq!(
            connector.store_dir(&Endpoint::new("db.local", 27017)),
            tmp.path().join("db.local_27017")
        );
        assert_eq!(
            connector.store_dir(&Endpoint::new("[::1]", 9)),
            tmp.path().join("___1__9")
        );

        let store = connector.connect(&Endpoint::new("db.local", 27017)).unwrap();
        store.insert(blobfs_store::PathEntry::new("/k", b"v".to_vec())).unwrap();
        assert!(tmp.path().join("db.local_27017").is_dir());
    }

    #[test]
    fn directory_connections_share_state() {
        let tmp = tempfile::tempdir().unwrap();
        let connector = DirectoryConnector::new(tmp.path());
        let endpoint = Endpoint::new("h", 1);
        connector
            .connect(&endpoint)
            .unwrap()
            .insert(blobfs_store::PathEntry::new("/k", b"v".to_vec()))
            .unwrap();
        let again = connector.connect(&endpoint).unwrap();
        assert_eq!(again.find("/k").unwrap().unwrap().payload, b"v");
    }

    #[test]
    fn unreachable_directory_is_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let connector = DirectoryConnector::new(&blocker);
        let err = connector.connect(&Endpoint::new("h", 1)).err().expect("should fail");
        assert!(matches!(err, StoreError::Unavailable { .. }), "got {err:?}");

        let err = connector.connect(&Endpoint::new("", 1)).err().expect("should fail");
        assert!(matches!(err, StoreError::Unavailable { .. }), "got {err:?}");
    }
}
