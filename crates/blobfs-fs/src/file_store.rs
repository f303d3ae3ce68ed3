//! The [`FileStore`] handle: directory semantics for one path.

use std::io::{Read, Write};
use std::sync::Arc;

use blobfs_store::{open_write, EntryWriter, PathEntry, PathStore, StoreError};
use tracing::{debug, trace};

use crate::error::{FsError, FsResult};
use crate::info::FileInfo;
use crate::listing::{encode_listing, is_listable_name, parse_listing, ChildNames};
use crate::locks::ListingLocks;
use crate::path::FsPath;

/// Options for [`FileStore::create_dir`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Fail instead of creating missing parent directories.
    pub shallow: bool,
}

impl CreateOptions {
    /// Create missing parents (the default).
    pub const DEEP: Self = Self { shallow: false };
    /// Require the parent to exist.
    pub const SHALLOW: Self = Self { shallow: true };
}

/// A path store together with the listing locks of every handle opened on it.
///
/// Cloning is cheap and shares both the store and the locks. Handles that
/// should serialize listing rewrites against each other must come from the
/// same `StoreHandle`.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn PathStore>,
    locks: Arc<ListingLocks>,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn PathStore>) -> Self {
        Self {
            store,
            locks: Arc::new(ListingLocks::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn PathStore> {
        &self.store
    }

    pub fn locks(&self) -> &ListingLocks {
        &self.locks
    }

    /// Bind a [`FileStore`] to `path` on this store.
    pub fn open(&self, path: impl Into<FsPath>) -> FileStore {
        FileStore::new(self.clone(), path.into())
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("store", &self.store.describe())
            .field("locks", &self.locks)
            .finish()
    }
}

#[derive(Clone, Copy, Debug)]
enum ListingChange {
    Add,
    Remove,
}

/// A handle bound to one path of a store.
///
/// Construction does no I/O. Every operation reads the current state from
/// the store, so handles hold no cached state and can be created freely.
/// All operations may block on store I/O.
#[derive(Clone, Debug)]
pub struct FileStore {
    handle: StoreHandle,
    path: FsPath,
}

impl FileStore {
    pub fn new(handle: StoreHandle, path: FsPath) -> Self {
        Self { handle, path }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    /// Last path segment; empty for the root.
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Handle for the containing directory, or `None` at the root.
    pub fn parent(&self) -> Option<FileStore> {
        self.path
            .parent()
            .map(|path| FileStore::new(self.handle.clone(), path))
    }

    /// Handle for the child `name` of this path.
    pub fn child(&self, name: &str) -> FileStore {
        FileStore::new(self.handle.clone(), self.path.join(name))
    }

    fn store(&self) -> &dyn PathStore {
        self.handle.store.as_ref()
    }

    fn store_error(&self, source: StoreError) -> FsError {
        let path = self.path.clone();
        match source {
            StoreError::Corrupt { .. } | StoreError::Serialization(_) => {
                FsError::CorruptEntry { path, source }
            }
            StoreError::Unavailable { .. } | StoreError::Io(_) => {
                FsError::StoreUnavailable { path, source }
            }
        }
    }

    fn check_name(&self) -> FsResult<()> {
        if self.path.is_root() || is_listable_name(self.name()) {
            return Ok(());
        }
        Err(FsError::InvalidName {
            path: self.path.clone(),
        })
    }

    fn lookup(&self) -> FsResult<Option<PathEntry>> {
        trace!(path = %self.path, "lookup");
        self.store()
            .find(&self.path.as_key())
            .map_err(|e| self.store_error(e))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Report whether the path exists, its type and its length.
    ///
    /// The root is always a directory. If the store has no entry for it yet,
    /// one is created on the spot.
    pub fn info(&self) -> FsResult<FileInfo> {
        let mut entry = self.lookup()?;
        if entry.is_none() && self.path.is_root() {
            self.ensure_directory_entry()?;
            entry = self.lookup()?;
            if entry.is_none() {
                debug!(store = %self.handle.store.describe(), "store did not retain the root directory");
            }
        }

        Ok(match entry {
            Some(entry) => FileInfo::from_entry(self.name(), &entry),
            None => FileInfo::missing(self.name()),
        })
    }

    /// Names of the immediate children, in stored order.
    ///
    /// Empty when the path does not exist or is a file.
    pub fn child_names(&self) -> FsResult<Vec<String>> {
        match self.lookup()? {
            Some(entry) if entry.is_directory() => Ok(parse_listing(&entry.payload)),
            _ => Ok(Vec::new()),
        }
    }

    /// Handles for the immediate children.
    pub fn children(&self) -> FsResult<Vec<FileStore>> {
        Ok(self
            .child_names()?
            .iter()
            .map(|name| self.child(name))
            .collect())
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Create this path as a directory.
    ///
    /// Succeeds without writing if the directory already exists. Missing
    /// parents are created first unless `options.shallow` is set.
    pub fn create_dir(&self, options: CreateOptions) -> FsResult<FileStore> {
        self.check_name()?;
        if let Some(entry) = self.lookup()? {
            if entry.is_directory() {
                return Ok(self.clone());
            }
            return Err(FsError::AlreadyExistsAsFile {
                path: self.path.clone(),
            });
        }

        if let Some(parent) = self.parent() {
            let parent_info = parent.settled_info()?;
            if parent_info.exists && !parent_info.is_directory {
                return Err(FsError::ParentNotDirectory {
                    path: self.path.clone(),
                });
            }
            if !parent_info.exists {
                if options.shallow {
                    return Err(FsError::ParentMissing {
                        path: self.path.clone(),
                    });
                }
                parent.create_dir(options)?;
            }
            self.update_parent_listing(ListingChange::Add)?;
        }

        self.ensure_directory_entry()?;
        debug!(path = %self.path, "created directory");
        Ok(self.clone())
    }

    /// Open the file for reading from the start.
    pub fn open_read(&self) -> FsResult<Box<dyn Read + Send>> {
        let entry = self.lookup()?.ok_or_else(|| FsError::NotFound {
            path: self.path.clone(),
        })?;
        if entry.is_directory() {
            return Err(FsError::IsDirectory {
                path: self.path.clone(),
            });
        }
        self.store()
            .open_read(&entry)
            .map_err(|e| self.store_error(e))
    }

    /// Open the file for writing.
    ///
    /// The written bytes replace the whole file once the returned writer is
    /// closed. The parent must already exist; it is never created here. Any
    /// previous contents are removed immediately and the name is registered
    /// in the parent listing before the writer is returned, so a writer that
    /// is dropped without closing leaves a listed name with no entry.
    pub fn open_write(&self) -> FsResult<EntryWriter> {
        self.check_name()?;
        let info = self.settled_info()?;
        if info.exists && info.is_directory {
            return Err(FsError::IsDirectory {
                path: self.path.clone(),
            });
        }

        let parent = self.parent().ok_or_else(|| FsError::IsDirectory {
            path: self.path.clone(),
        })?;
        let parent_info = parent.settled_info()?;
        if !parent_info.exists {
            return Err(FsError::ParentMissing {
                path: self.path.clone(),
            });
        }
        if !parent_info.is_directory {
            return Err(FsError::ParentNotDirectory {
                path: self.path.clone(),
            });
        }

        let key = self.path.as_key();
        self.store().remove(&key).map_err(|e| self.store_error(e))?;
        self.update_parent_listing(ListingChange::Add)?;

        trace!(path = %self.path, "opened for write");
        Ok(open_write(Arc::clone(&self.handle.store), &key))
    }

    /// Remove this path and its name from the parent listing.
    ///
    /// Deleting a directory does not delete its descendants: their entries
    /// stay in the store but are no longer reachable through any listing.
    pub fn delete(&self) -> FsResult<()> {
        self.update_parent_listing(ListingChange::Remove)?;
        let existed = self
            .store()
            .remove(&self.path.as_key())
            .map_err(|e| self.store_error(e))?;
        debug!(path = %self.path, existed, "deleted");
        Ok(())
    }

    /// Accepts updated info and ignores it.
    ///
    /// The only modelled attribute is the directory flag, which never
    /// changes after creation.
    pub fn put_info(&self, info: &FileInfo) -> FsResult<()> {
        trace!(path = %self.path, ?info, "put_info ignored");
        Ok(())
    }

    // ---------------------------------------------------------------
    // Convenience
    // ---------------------------------------------------------------

    /// Read the whole file.
    pub fn read_to_vec(&self) -> FsResult<Vec<u8>> {
        let mut reader = self.open_read()?;
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .map_err(|e| self.store_error(e.into()))?;
        Ok(buf)
    }

    /// Replace the file contents with `bytes`.
    pub fn write_all(&self, bytes: &[u8]) -> FsResult<()> {
        let mut writer = self.open_write()?;
        writer
            .write_all(bytes)
            .map_err(|e| self.store_error(e.into()))?;
        writer.close().map_err(|e| self.store_error(e))
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// Like [`info`](Self::info), but waits out a listing rewrite in flight.
    ///
    /// A rewrite removes a directory entry before storing its replacement, so
    /// a bare lookup can miss a directory that exists throughout. Rewrites
    /// hold the directory's listing lock, so a miss is confirmed under it.
    fn settled_info(&self) -> FsResult<FileInfo> {
        let info = self.info()?;
        if info.exists {
            return Ok(info);
        }

        let _guard = self.handle.locks.lock(&self.path.as_key());
        Ok(match self.lookup()? {
            Some(entry) => {
                trace!(path = %self.path, "entry reappeared after listing rewrite");
                FileInfo::from_entry(self.name(), &entry)
            }
            None => info,
        })
    }

    /// Store an empty directory entry at this path unless one appeared
    /// meanwhile. Runs under this path's listing lock so it cannot clobber a
    /// listing a concurrent child creation just wrote.
    fn ensure_directory_entry(&self) -> FsResult<()> {
        let key = self.path.as_key();
        let _guard = self.handle.locks.lock(&key);

        match self.lookup()? {
            Some(entry) if entry.is_directory() => Ok(()),
            Some(_) => Err(FsError::AlreadyExistsAsFile {
                path: self.path.clone(),
            }),
            None => {
                trace!(path = %self.path, "storing directory entry");
                self.store()
                    .create_empty(&key)
                    .mark_directory()
                    .save(self.store())
                    .map_err(|e| self.store_error(e))
            }
        }
    }

    /// Add or remove this node's name in the parent's listing.
    ///
    /// The store cannot edit an entry, so a change rewrites the parent
    /// wholesale: remove the old entry, store a new one with the updated
    /// listing. Nothing is written when the name is already present (add)
    /// or absent (remove).
    fn update_parent_listing(&self, change: ListingChange) -> FsResult<()> {
        let Some(parent) = self.parent() else {
            return Ok(());
        };
        let parent_key = parent.path.as_key();
        let _guard = self.handle.locks.lock(&parent_key);

        let mut names = ChildNames::from_names(parent.child_names()?);
        let name = self.name();
        let changed = match change {
            ListingChange::Add => names.insert(name),
            ListingChange::Remove => names.remove(name),
        };
        if !changed {
            trace!(parent = %parent.path, name, ?change, "listing unchanged");
            return Ok(());
        }

        let store = self.store();
        store
            .remove(&parent_key)
            .map_err(|e| self.store_error(e))?;
        let mut writer = store
            .create_empty(&parent_key)
            .mark_directory()
            .into_writer(Arc::clone(&self.handle.store));
        writer
            .write_all(&encode_listing(&names))
            .map_err(|e| self.store_error(e.into()))?;
        writer.close().map_err(|e| self.store_error(e))?;

        debug!(parent = %parent.path, name, ?change, children = names.len(), "rewrote listing");
        Ok(())
    }
}
