//! Flat, path-keyed blob storage for BlobFS.
//!
//! This crate is the only layer that talks to the underlying blob store. It
//! knows nothing about directories beyond an `isDirectory` metadata flag: each
//! [`PathEntry`] is one record keyed by its full path string, carrying a byte
//! payload and a small metadata map.
//!
//! # Storage Backends
//!
//! All backends implement the [`PathStore`] trait:
//!
//! - [`InMemoryPathStore`] -- `HashMap`-based store for tests and embedding
//! - [`DirectoryPathStore`] -- one CRC-framed record file per entry on disk
//! - [`NullPathStore`] -- stores nothing; stands in for unreachable stores
//!
//! # Design Rules
//!
//! 1. There is no update-in-place. Replacing an entry is `remove` followed by
//!    a fresh `insert`.
//! 2. `insert` over an occupied key replaces the old entry and logs a
//!    warning. Callers remove stale entries first.
//! 3. An entry written through an [`EntryWriter`] exists only once the writer
//!    is closed. A dropped writer stores nothing.
//! 4. Backend failures surface as [`StoreError::Unavailable`] or
//!    [`StoreError::Io`] and are never retried here.

pub mod directory;
pub mod entry;
pub mod error;
pub mod memory;
pub mod null;
pub mod stream;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use directory::DirectoryPathStore;
pub use entry::{EntryMetadata, PathEntry, PendingEntry};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryPathStore;
pub use null::NullPathStore;
pub use stream::{open_write, EntryWriter};
pub use traits::PathStore;
