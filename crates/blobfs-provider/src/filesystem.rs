use std::sync::Arc;

use blobfs_fs::{FileStore, FsPath, StoreHandle};
use blobfs_store::NullPathStore;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, warn};
use url::Url;

use crate::config::BlobFsConfig;
use crate::connector::StoreConnector;
use crate::endpoint::Endpoint;
use crate::error::{ProviderError, ProviderResult};
use crate::registry::StoreRegistry;

/// Bytes escaped in one path segment of a locator.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Entry point for resolving locators such as
/// `blobfs://host:port/a/b` to [`FileStore`] handles.
///
/// Missing host and port fall back to the configured defaults. Connections
/// are opened lazily, one per endpoint, and live until
/// [`shutdown`](Self::shutdown).
pub struct BlobFileSystem {
    config: BlobFsConfig,
    registry: StoreRegistry,
}

impl BlobFileSystem {
    /// A file system connecting through the backend named in `config`.
    pub fn new(config: BlobFsConfig) -> Self {
        let connector = config.backend.connector();
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: BlobFsConfig, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            config,
            registry: StoreRegistry::new(connector),
        }
    }

    pub fn config(&self) -> &BlobFsConfig {
        &self.config
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Split a locator into its endpoint and normalized path. Does no I/O.
    pub fn resolve(&self, uri: &str) -> ProviderResult<(Endpoint, FsPath)> {
        let url = Url::parse(uri).map_err(|e| ProviderError::InvalidLocator {
            locator: uri.to_string(),
            reason: e.to_string(),
        })?;
        if url.scheme() != self.config.scheme {
            return Err(ProviderError::SchemeMismatch {
                expected: self.config.scheme.clone(),
                found: url.scheme().to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .unwrap_or(self.config.default_host.as_str());
        let port = url.port().unwrap_or(self.config.default_port);
        Ok((Endpoint::new(host, port), decode_path(&url)))
    }

    /// Resolve `uri`, connecting to its endpoint if needed.
    pub fn try_store(&self, uri: &str) -> ProviderResult<FileStore> {
        let (endpoint, path) = self.resolve(uri)?;
        self.store_at(&endpoint, path)
    }

    /// Resolve `uri`, falling back to a store that holds nothing.
    ///
    /// Malformed locators, foreign schemes and unreachable endpoints are
    /// logged and yield a [`FileStore`] over [`NullPathStore`]: it reports
    /// every path as missing and discards writes.
    pub fn store(&self, uri: &str) -> FileStore {
        match self.try_store(uri) {
            Ok(store) => store,
            Err(e) => {
                warn!(locator = uri, error = %e, "falling back to null store");
                let path = Url::parse(uri)
                    .map(|url| decode_path(&url))
                    .unwrap_or_default();
                StoreHandle::new(Arc::new(NullPathStore)).open(path)
            }
        }
    }

    /// The file store for `path` on `endpoint`, without locator parsing.
    pub fn store_at(&self, endpoint: &Endpoint, path: impl Into<FsPath>) -> ProviderResult<FileStore> {
        let path = path.into();
        let handle = self.registry.handle(endpoint)?;
        debug!(%endpoint, %path, "resolved");
        Ok(handle.open(path))
    }

    /// The locator that resolves back to `path` on `endpoint`.
    pub fn to_uri(&self, endpoint: &Endpoint, path: &FsPath) -> String {
        let mut uri = format!("{}://{}", self.config.scheme, endpoint);
        if path.is_root() {
            uri.push('/');
        }
        for segment in path.segments() {
            uri.push('/');
            uri.extend(utf8_percent_encode(segment, SEGMENT));
        }
        uri
    }

    pub fn can_delete(&self) -> bool {
        true
    }

    pub fn can_write(&self) -> bool {
        true
    }

    /// Close every open connection. Returns how many were open.
    pub fn shutdown(&self) -> usize {
        self.registry.shutdown()
    }
}

impl std::fmt::Debug for BlobFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobFileSystem")
            .field("scheme", &self.config.scheme)
            .field("registry", &self.registry)
            .finish()
    }
}

fn decode_path(url: &Url) -> FsPath {
    FsPath::parse(&percent_decode_str(url.path()).decode_utf8_lossy())
}
