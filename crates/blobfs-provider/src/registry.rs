use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use blobfs_fs::StoreHandle;
use blobfs_store::{StoreError, StoreResult};
use tracing::{info, trace, warn};

use crate::connector::StoreConnector;
use crate::endpoint::Endpoint;

/// One shared connection per endpoint, for the lifetime of the registry.
///
/// The first [`handle`](Self::handle) call for an endpoint connects and
/// records the result; later calls get a clone of the same
/// [`StoreHandle`], so every file store on that endpoint shares one store
/// and one set of listing locks. [`shutdown`](Self::shutdown) closes all
/// connections and refuses new ones.
pub struct StoreRegistry {
    connector: Arc<dyn StoreConnector>,
    /// `None` once shut down.
    stores: Mutex<Option<HashMap<Endpoint, StoreHandle>>>,
}

impl StoreRegistry {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            connector,
            stores: Mutex::new(Some(HashMap::new())),
        }
    }

    /// The handle for `endpoint`, connecting on first use.
    ///
    /// Connecting happens under the registry lock, so concurrent first
    /// resolutions of one endpoint still produce a single connection.
    pub fn handle(&self, endpoint: &Endpoint) -> StoreResult<StoreHandle> {
        let mut guard = self.stores.lock().expect("lock poisoned");
        let stores = guard
            .as_mut()
            .ok_or_else(|| StoreError::unavailable(endpoint.to_string(), "registry is shut down"))?;

        if let Some(handle) = stores.get(endpoint) {
            trace!(%endpoint, "reusing connection");
            return Ok(handle.clone());
        }

        let store = self.connector.connect(endpoint)?;
        info!(%endpoint, store = %store.describe(), "connected");
        let handle = StoreHandle::new(store);
        stores.insert(endpoint.clone(), handle.clone());
        Ok(handle)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.stores
            .lock()
            .expect("lock poisoned")
            .as_ref()
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_shut_down(&self) -> bool {
        self.stores.lock().expect("lock poisoned").is_none()
    }

    /// Close every connection and stop accepting new ones.
    ///
    /// Returns the number of connections that were open. Close failures are
    /// logged and do not stop the remaining closes. Calling this again is a
    /// no-op returning 0.
    pub fn shutdown(&self) -> usize {
        let Some(stores) = self.stores.lock().expect("lock poisoned").take() else {
            return 0;
        };
        for (endpoint, handle) in &stores {
            if let Err(e) = handle.store().close() {
                warn!(%endpoint, error = %e, "failed to close store");
            }
        }
        info!(connections = stores.len(), "store registry shut down");
        stores.len()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("connections", &self.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use blobfs_store::{InMemoryPathStore, PathStore};

    use super::*;

    /// Counts connections and hands out in-memory stores.
    #[derive(Default)]
    struct CountingConnector {
        connects: AtomicUsize,
    }

    impl StoreConnector for CountingConnector {
        fn connect(&self, _endpoint: &Endpoint) -> StoreResult<Arc<dyn PathStore>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(InMemoryPathStore::new()))
        }
    }

    struct FailingConnector;

    impl StoreConnector for FailingConnector {
        fn connect(&self, endpoint: &Endpoint) -> StoreResult<Arc<dyn PathStore>> {
            Err(StoreError::unavailable(endpoint.to_string(), "unknown host"))
        }
    }

    #[test]
    fn same_endpoint_reuses_connection() {
        let connector = Arc::new(CountingConnector::default());
        let registry = StoreRegistry::new(connector.clone());
        let endpoint = Endpoint::new("h", 1);

        let a = registry.handle(&endpoint).unwrap();
        let b = registry.handle(&endpoint).unwrap();
        assert!(Arc::ptr_eq(a.store(), b.store()));
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_endpoints_get_distinct_connections() {
        let registry = StoreRegistry::new(Arc::new(CountingConnector::default()));
        let a = registry.handle(&Endpoint::new("h", 1)).unwrap();
        let b = registry.handle(&Endpoint::new("h", 2)).unwrap();
        assert!(!Arc::ptr_eq(a.store(), b.store()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn concurrent_first_use_connects_once() {
        let connector = Arc::new(CountingConnector::default());
        let registry = Arc::new(StoreRegistry::new(connector.clone()));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.handle(&Endpoint::new("h", 1)).unwrap())
            })
            .collect();
        for t in threads {
            t.join().expect("thread should not panic");
        }
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_connect_is_not_recorded() {
        let registry = StoreRegistry::new(Arc::new(FailingConnector));
        let err = registry.handle(&Endpoint::new("nowhere", 1)).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn shutdown_closes_and_refuses() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new(Arc::new(crate::DirectoryConnector::new(tmp.path())));
        let handle = registry.handle(&Endpoint::new("h", 1)).unwrap();
        registry.handle(&Endpoint::new("h", 2)).unwrap();

        assert_eq!(registry.shutdown(), 2);
        assert!(registry.is_shut_down());
        assert!(registry.is_empty());
        assert!(handle.store().find("/").is_err());
        assert!(registry.handle(&Endpoint::new("h", 1)).is_err());
        assert_eq!(registry.shutdown(), 0);
    }
}
