//! Snapshot Persistence Module
//!
//! Serializes the dedup store to a single JSON file and restores it at
//! startup. The file is rewritten wholesale on every persist; the write
//! goes to a sibling temp file first and is renamed over the target, so a
//! reader never observes a half-written snapshot.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::DedupEntry;
use crate::error::{NotifierError, Result};

// == Snapshot File ==
/// Handle to the on-disk snapshot of the dedup store.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    // == Constructor ==
    /// Creates a handle for the snapshot at `path`. No I/O happens until
    /// `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot's on-disk location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Load ==
    /// Reads the snapshot from disk.
    ///
    /// # Returns
    /// - `Ok(Some(entries))` when the file exists and parses
    /// - `Ok(None)` when the file does not exist (fresh start)
    /// - `Err(Persist)` when the file exists but cannot be read
    /// - `Err(CorruptSnapshot)` when the content does not parse
    pub fn load(&self) -> Result<Option<HashMap<String, DedupEntry>>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(NotifierError::Persist {
                    path: self.path.clone(),
                    source: err,
                })
            }
        };

        let entries = serde_json::from_slice(&data).map_err(|err| {
            NotifierError::CorruptSnapshot {
                path: self.path.clone(),
                source: err,
            }
        })?;

        Ok(Some(entries))
    }

    // == Save ==
    /// Writes `entries` to disk, replacing the previous snapshot.
    ///
    /// The data is written to `<path>.tmp` and renamed into place. Either
    /// the new snapshot lands completely or the previous one remains.
    pub fn save(&self, entries: &HashMap<String, DedupEntry>) -> Result<()> {
        let data = serde_json::to_vec(entries).map_err(|err| NotifierError::Persist {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })?;

        let tmp = self.tmp_path();
        fs::write(&tmp, &data).map_err(|err| NotifierError::Persist {
            path: tmp.clone(),
            source: err,
        })?;
        fs::rename(&tmp, &self.path).map_err(|err| NotifierError::Persist {
            path: self.path.clone(),
            source: err,
        })?;

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp: OsString = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn scratch_path(tag: &str) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "notifier-snapshot-{}-{}-{}.db",
            tag,
            std::process::id(),
            seq
        ))
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let snapshot = SnapshotFile::new(scratch_path("missing"));
        assert!(snapshot.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = scratch_path("roundtrip");
        let snapshot = SnapshotFile::new(&path);

        let mut entries = HashMap::new();
        entries.insert("alert-a".to_string(), DedupEntry::new(300, 1_700_000_000));
        entries.insert("alert-b".to_string(), DedupEntry::new(60, 1_700_000_100));

        snapshot.save(&entries).unwrap();
        let loaded = snapshot.load().unwrap().unwrap();

        assert_eq!(loaded, entries);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let path = scratch_path("overwrite");
        let snapshot = SnapshotFile::new(&path);

        let mut first = HashMap::new();
        first.insert("gone".to_string(), DedupEntry::new(60, 1_700_000_000));
        snapshot.save(&first).unwrap();

        let second = HashMap::new();
        snapshot.save(&second).unwrap();

        let loaded = snapshot.load().unwrap().unwrap();
        assert!(loaded.is_empty());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_leaves_no_tmp_file_behind() {
        let path = scratch_path("tmpfile");
        let snapshot = SnapshotFile::new(&path);

        snapshot.save(&HashMap::new()).unwrap();

        assert!(path.exists());
        assert!(!snapshot.tmp_path().exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let path = scratch_path("corrupt");
        fs::write(&path, b"not json {{{").unwrap();

        let snapshot = SnapshotFile::new(&path);
        let result = snapshot.load();

        assert!(matches!(
            result,
            Err(NotifierError::CorruptSnapshot { .. })
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wire_format_matches_legacy_layout() {
        let path = scratch_path("wire");
        let snapshot = SnapshotFile::new(&path);

        let mut entries = HashMap::new();
        entries.insert("doc-1234".to_string(), DedupEntry::new(480, 1_700_000_000));
        snapshot.save(&entries).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["doc-1234"]["createtime"], 1_700_000_000);
        assert_eq!(raw["doc-1234"]["ttl"], 480);
        fs::remove_file(&path).unwrap();
    }
}
