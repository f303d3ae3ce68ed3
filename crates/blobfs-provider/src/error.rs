use std::path::PathBuf;

use blobfs_store::StoreError;
use thiserror::Error;

/// Why a locator could not be resolved to a live store.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("unsupported scheme '{found}', expected '{expected}'")]
    SchemeMismatch { expected: String, found: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors loading a [`BlobFsConfig`](crate::BlobFsConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
