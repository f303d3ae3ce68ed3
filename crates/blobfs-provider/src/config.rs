use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connector::{DirectoryConnector, MemoryConnector, StoreConnector};
use crate::endpoint::Endpoint;
use crate::error::ConfigError;

/// Locator scheme handled by default.
pub const DEFAULT_SCHEME: &str = "blobfs";
/// Host used when a locator names none.
pub const DEFAULT_HOST: &str = "localhost";
/// Port used when a locator names none.
pub const DEFAULT_PORT: u16 = 27017;

/// Settings for [`BlobFileSystem`](crate::BlobFileSystem).
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```toml
/// default_host = "db.internal"
///
/// [backend]
/// kind = "directory"
/// root = "/var/lib/blobfs"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobFsConfig {
    pub scheme: String,
    pub default_host: String,
    pub default_port: u16,
    pub backend: BackendConfig,
}

impl Default for BlobFsConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            default_host: DEFAULT_HOST.to_string(),
            default_port: DEFAULT_PORT,
            backend: BackendConfig::default(),
        }
    }
}

impl BlobFsConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The endpoint used for locators that name no host or port.
    pub fn default_endpoint(&self) -> Endpoint {
        Endpoint::new(self.default_host.clone(), self.default_port)
    }
}

/// Which store backend endpoints connect to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// A fresh in-memory store per endpoint, lost on exit.
    #[default]
    Memory,
    /// Record files under `root`, one subdirectory per endpoint.
    Directory { root: PathBuf },
}

impl BackendConfig {
    pub fn connector(&self) -> Arc<dyn StoreConnector> {
        match self {
            Self::Memory => Arc::new(MemoryConnector),
            Self::Directory { root } => Arc::new(DirectoryConnector::new(root.clone())),
        }
    }
}
