//! Locator resolution and connection management for BlobFS.
//!
//! [`BlobFileSystem`] turns a locator such as `blobfs://host:port/a/b` into a
//! [`FileStore`](blobfs_fs::FileStore). Connections are owned by a
//! [`StoreRegistry`] that opens one store per [`Endpoint`] on first use and
//! closes them all on shutdown. Resolution failures degrade to a store that
//! holds nothing instead of surfacing connection errors.

pub mod config;
pub mod connector;
pub mod endpoint;
pub mod error;
pub mod filesystem;
pub mod registry;

pub use config::{BackendConfig, BlobFsConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SCHEME};
pub use connector::{DirectoryConnector, MemoryConnector, StoreConnector};
pub use endpoint::Endpoint;
pub use error::{ConfigError, ProviderError, ProviderResult};
pub use filesystem::BlobFileSystem;
pub use registry::StoreRegistry;
