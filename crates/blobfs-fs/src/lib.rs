//! Hierarchical filesystem semantics for BlobFS.
//!
//! The underlying [`PathStore`](blobfs_store::PathStore) is flat: it looks up
//! whole entries by exact key and knows nothing about parents or children.
//! This crate emulates a directory tree on top of it:
//!
//! - every path maps to one key, its normalized absolute form ([`FsPath`]);
//! - a directory is an entry flagged `isDirectory` whose payload is the
//!   newline-delimited list of its child names ([`listing`]);
//! - creating or deleting a node rewrites its parent's listing.
//!
//! # Key Types
//!
//! - [`FileStore`] -- handle bound to one path; all filesystem operations
//! - [`FileInfo`] -- result of an info query
//! - [`StoreHandle`] -- a store shared with the listing locks that guard it
//! - [`ListingLocks`] -- per-parent mutexes for listing rewrites
//!
//! # Consistency
//!
//! The store has no atomic "append child" primitive, so a listing update is
//! read-modify-write: read the parent's listing, change it, remove the old
//! parent entry, insert the new one. Within one process [`ListingLocks`]
//! serializes those rewrites per parent. Across processes sharing one store
//! the race remains: the last rewrite wins and may drop a concurrent
//! membership change. Closing that gap needs a conditional update in the
//! store itself.

pub mod error;
pub mod file_store;
pub mod info;
pub mod listing;
pub mod locks;
pub mod path;

pub use error::{FsError, FsResult};
pub use file_store::{CreateOptions, FileStore, StoreHandle};
pub use info::FileInfo;
pub use listing::{encode_listing, is_listable_name, parse_listing, ChildNames};
pub use locks::{ListingGuard, ListingLocks};
pub use path::FsPath;
