use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use crate::entry::PathEntry;
use crate::error::{StoreError, StoreResult};
use crate::traits::PathStore;

/// Record magic: identifies a BlobFS entry file, format version 1.
const MAGIC: &[u8; 4] = b"BFS1";

/// Header size: 4 bytes magic + 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 12;

/// File extension of record files.
const RECORD_EXT: &str = "entry";

/// Path store persisting one record file per entry under a root directory.
///
/// On-disk format of each record:
/// ```text
/// [4 bytes: magic "BFS1"]
/// [4 bytes: body length (little-endian u32)]
/// [4 bytes: CRC32 of body (little-endian u32)]
/// [N bytes: body (bincode-serialized PathEntry)]
/// ```
///
/// Record files are named by the hex BLAKE3 hash of the key, so keys may
/// contain any characters. Writes go to a temporary file in the same
/// directory and are renamed into place, so readers never observe a torn
/// record.
pub struct DirectoryPathStore {
    root: PathBuf,
    closed: AtomicBool,
}

impl DirectoryPathStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: &Path) -> StoreResult<Self> {
        fs::create_dir_all(root)?;
        debug!(root = %root.display(), "opened directory store");
        Ok(Self {
            root: root.to_path_buf(),
            closed: AtomicBool::new(false),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::unavailable(self.describe(), "store is closed"));
        }
        Ok(())
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let digest = blake3::hash(key.as_bytes());
        self.root
            .join(format!("{}.{RECORD_EXT}", hex::encode(digest.as_bytes())))
    }
}

/// Frame an entry as a record.
fn encode_record(entry: &PathEntry) -> StoreResult<Vec<u8>> {
    let body = bincode::serialize(entry).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(body.len()).map_err(|_| {
        StoreError::Serialization(format!("entry {} exceeds record size limit", entry.key))
    })?;
    let crc = crc32fast::hash(&body);

    let mut record = Vec::with_capacity(HEADER_SIZE + body.len());
    record.extend_from_slice(MAGIC);
    record.extend_from_slice(&length.to_le_bytes());
    record.extend_from_slice(&crc.to_le_bytes());
    record.extend_from_slice(&body);
    Ok(record)
}

/// Validate and decode a record read for `key`.
fn decode_record(key: &str, record: &[u8]) -> StoreResult<PathEntry> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.to_string(),
        reason,
    };

    if record.len() < HEADER_SIZE {
        return Err(corrupt(format!("record too short ({} bytes)", record.len())));
    }
    if &record[0..4] != MAGIC {
        return Err(corrupt("bad record magic".to_string()));
    }

    let length = u32::from_le_bytes([record[4], record[5], record[6], record[7]]) as usize;
    let expected_crc = u32::from_le_bytes([record[8], record[9], record[10], record[11]]);

    let body = &record[HEADER_SIZE..];
    if body.len() != length {
        return Err(corrupt(format!(
            "body length {} does not match header length {length}",
            body.len()
        )));
    }

    let actual_crc = crc32fast::hash(body);
    if actual_crc != expected_crc {
        return Err(corrupt(format!(
            "CRC mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"
        )));
    }

    bincode::deserialize(body).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl PathStore for DirectoryPathStore {
    fn find(&self, key: &str) -> StoreResult<Option<PathEntry>> {
        self.ensure_open()?;
        let path = self.record_path(key);
        let record = match fs::read(&path) {
            Ok(record) => record,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry = decode_record(key, &record)?;
        if entry.key != key {
            warn!(key, stored = %entry.key, "record hash collision; treating as absent");
            return Ok(None);
        }
        trace!(key, len = entry.len(), "record read");
        Ok(Some(entry))
    }

    fn insert(&self, mut entry: PathEntry) -> StoreResult<()> {
        self.ensure_open()?;
        entry.metadata.uploaded_at = Some(Utc::now());
        let record = encode_record(&entry)?;
        let path = self.record_path(&entry.key);

        if path.exists() {
            warn!(key = %entry.key, "insert displaced an entry that was not removed first");
        }

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&record)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(key = %entry.key, len = entry.len(), "record written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        debug!(root = %self.root.display(), "closed directory store");
        Ok(())
    }
}

impl std::fmt::Debug for DirectoryPathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryPathStore")
            .field("root", &self.root)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (tempfile::TempDir, DirectoryPathStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPathStore::open(&dir.path().join("store")).unwrap();
        (dir, store)
    }

    #[test]
    fn insert_and_find_roundtrip() {
        let (_dir, store) = open_store();
        store
            .insert(PathEntry::directory("/docs", b"a.txt\nb.txt\n".to_vec()))
            .unwrap();

        let entry = store.find("/docs").unwrap().expect("entry present");
        assert_eq!(entry.key, "/docs");
        assert!(entry.is_directory());
        assert_eq!(entry.payload, b"a.txt\nb.txt\n");
        assert!(entry.metadata.uploaded_at.is_some());
    }

    #[test]
    fn find_missing_returns_none() {
        let (_dir, store) = open_store();
        assert!(store.find("/nope").unwrap().is_none());
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirectoryPathStore::open(dir.path()).unwrap();
            store.insert(PathEntry::new("/keep", vec![1, 2, 3])).unwrap();
        }
        let store = DirectoryPathStore::open(dir.path()).unwrap();
        assert_eq!(store.find("/keep").unwrap().unwrap().payload, vec![1, 2, 3]);
    }

    #[test]
    fn remove_reports_presence() {
        let (_dir, store) = open_store();
        store.insert(PathEntry::new("/f", b"x".to_vec())).unwrap();
        assert!(store.remove("/f").unwrap());
        assert!(!store.remove("/f").unwrap());
        assert!(store.find("/f").unwrap().is_none());
    }

    #[test]
    fn keys_with_odd_characters() {
        let (_dir, store) = open_store();
        let key = "/weird dir/ünïcode/..\\name";
        store.insert(PathEntry::new(key, b"ok".to_vec())).unwrap();
        assert_eq!(store.find(key).unwrap().unwrap().payload, b"ok");
    }

    #[test]
    fn crc_detects_corruption() {
        let (_dir, store) = open_store();
        store.insert(PathEntry::new("/c", b"payload".to_vec())).unwrap();

        let path = store.record_path("/c");
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let err = store.find("/c").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }), "got {err:?}");
    }

    #[test]
    fn truncated_record_is_corrupt() {
        let (_dir, store) = open_store();
        fs::write(store.record_path("/t"), b"BFS").unwrap();
        assert!(matches!(
            store.find("/t").unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let (_dir, store) = open_store();
        fs::write(store.record_path("/m"), [0u8; 16]).unwrap();
        assert!(matches!(
            store.find("/m").unwrap_err(),
            StoreError::Corrupt { .. }
        ));
    }

    #[test]
    fn closed_store_is_unavailable() {
        let (_dir, store) = open_store();
        store.close().unwrap();
        assert!(matches!(
            store.find("/x").unwrap_err(),
            StoreError::Unavailable { .. }
        ));
        assert!(matches!(
            store.insert(PathEntry::new("/x", Vec::new())).unwrap_err(),
            StoreError::Unavailable { .. }
        ));
    }

    #[test]
    fn record_frame_layout() {
        let entry = PathEntry::new("/frame", b"abc".to_vec());
        let record = encode_record(&entry).unwrap();
        assert_eq!(&record[0..4], MAGIC);
        let length = u32::from_le_bytes(record[4..8].try_into().unwrap()) as usize;
        assert_eq!(length, record.len() - HEADER_SIZE);
        assert_eq!(decode_record("/frame", &record).unwrap(), entry);
    }
}
