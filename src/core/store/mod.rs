//! # Store Module
//!
//! The record cache: base name → [`PictureRecord`], persisted as `info.json`.
//!
//! The cache is a pure derivative of the files and can be deleted at any
//! time. One mutex guards the whole map; workers hold it only for single
//! entry reads and writes, which is cheap next to the file I/O they do.

use crate::core::record::PictureRecord;
use crate::core::scanner::{split_ext, ImageFormat};
use crate::error::StoreError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// File name of the cache inside the library root
pub const STORE_FILE_NAME: &str = "info.json";

/// Mutex-guarded map of store key to record
#[derive(Debug, Default)]
pub struct RecordStore {
    entries: Mutex<HashMap<String, PictureRecord>>,
}

/// Path of the backup kept next to a store file
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("~");
    PathBuf::from(name)
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is rebuilt from the files on any doubt, so a panic in another
    // holder does not make it unusable.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, PictureRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load a store file. A missing file gives an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No record cache, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let raw: HashMap<String, PictureRecord> =
            serde_json::from_str(&text).map_err(|e| StoreError::Corrupted {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut migrated = 0;
        let entries = raw
            .into_iter()
            .map(|(key, mut record)| {
                if !record.ext.is_empty() {
                    return (key, record);
                }
                // older caches keyed by full file name
                let (base, ext) = split_ext(&key);
                if ext.is_empty() {
                    return (key, record);
                }
                migrated += 1;
                record.ext = ext.to_string();
                if record.format == ImageFormat::Unknown {
                    record.format = ImageFormat::from_extension(&ext[1..]);
                }
                (base.to_string(), record)
            })
            .collect::<HashMap<_, _>>();

        info!(
            path = %path.display(),
            records = entries.len(),
            migrated,
            "Loaded record cache"
        );
        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    /// Write the store as tab-indented JSON, keeping the previous file as a
    /// `~` backup. An empty store is never written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let entries = self.entries();
        if entries.is_empty() {
            debug!(path = %path.display(), "Record cache empty, not saving");
            return Ok(());
        }

        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if path.exists() {
            fs::rename(path, backup_path(path)).map_err(io_err)?;
        }

        let sorted: BTreeMap<&String, &PictureRecord> = entries.iter().collect();
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        sorted
            .serialize(&mut serializer)
            .map_err(|e| StoreError::SerializationFailed(e.to_string()))?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        debug!(path = %path.display(), records = sorted.len(), "Saved record cache");
        Ok(())
    }

    /// Recompute `file` and `thumb` of every record from its key
    pub fn set_derived_paths(&self, all_dir: &Path, thumb_dir: &Path) {
        for (key, record) in self.entries().iter_mut() {
            record.set_derived_paths(key, all_dir, thumb_dir);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<PictureRecord> {
        self.entries().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, record: PictureRecord) {
        self.entries().insert(key.into(), record);
    }

    pub fn remove(&self, key: &str) -> Option<PictureRecord> {
        self.entries().remove(key)
    }

    /// Mutate a record in place. Returns false if the key is absent.
    pub fn update<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&mut PictureRecord),
    {
        match self.entries().get_mut(key) {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    /// Move a record to a new key. Returns false if `old` is absent.
    pub fn rekey(&self, old: &str, new: &str) -> bool {
        let mut entries = self.entries();
        match entries.remove(old) {
            Some(record) => {
                entries.insert(new.to_string(), record);
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    /// Copy of every entry, sorted by key
    pub fn snapshot(&self) -> Vec<(String, PictureRecord)> {
        let mut all: Vec<_> = self
            .entries()
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub fn clear_flags(&self) {
        for record in self.entries().values_mut() {
            record.flagged = false;
        }
    }

    /// Mark a key as seen during a sweep
    pub fn flag(&self, key: &str) -> bool {
        self.update(key, |record| record.flagged = true)
    }

    /// Keys not flagged since the last `clear_flags`, sorted
    pub fn unflagged_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self
            .entries()
            .iter()
            .filter(|(_, r)| !r.flagged)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop every unflagged entry, returning the removed keys
    pub fn retain_flagged(&self) -> Vec<String> {
        let removed = self.unflagged_keys();
        let mut entries = self.entries();
        for key in &removed {
            entries.remove(key);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str) -> PictureRecord {
        PictureRecord::new(format!("/lib/All/{}", name))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::load(&dir.path().join(STORE_FILE_NAME)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            RecordStore::load(&path),
            Err(StoreError::Corrupted { .. })
        ));
    }

    #[test]
    fn empty_store_is_never_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        RecordStore::new().save(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn save_and_load_round_trip_with_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);

        let store = RecordStore::new();
        store.insert("a", record("a.jpg"));
        store.save(&path).unwrap();
        assert!(!backup_path(&path).exists());

        store.insert("b", record("b.png"));
        store.save(&path).unwrap();
        assert!(backup_path(&path).exists());

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n\t\"a\": {"));
        assert!(!text.contains("/lib/All"));

        let loaded = RecordStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("b").unwrap().ext, ".png");

        let previous = RecordStore::load(&backup_path(&path)).unwrap();
        assert_eq!(previous.keys(), vec!["a".to_string()]);
    }

    #[test]
    fn legacy_entries_are_rekeyed_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, r#"{"img_1.jpg": {"desc": "old"}, "img_2": {"ext": ".heic"}}"#).unwrap();

        let store = RecordStore::load(&path).unwrap();
        let migrated = store.get("img_1").unwrap();
        assert_eq!(migrated.ext, ".jpg");
        assert_eq!(migrated.format, ImageFormat::Jpeg);
        assert_eq!(migrated.desc, "old");
        assert!(store.contains("img_2"));
        assert!(!store.contains("img_1.jpg"));
    }

    #[test]
    fn derived_paths_follow_keys() {
        let store = RecordStore::new();
        store.insert("x", record("ignored.jpg"));
        store.set_derived_paths(Path::new("/root/All"), Path::new("/thumbs"));
        let x = store.get("x").unwrap();
        assert_eq!(x.file, PathBuf::from("/root/All/x.jpg"));
        assert_eq!(x.thumb, PathBuf::from("/thumbs/x.jpg"));
    }

    #[test]
    fn rekey_moves_record() {
        let store = RecordStore::new();
        store.insert("old", record("old.jpg"));
        assert!(store.rekey("old", "new"));
        assert!(!store.rekey("old", "other"));
        assert!(store.contains("new"));
        assert!(!store.contains("old"));
    }

    #[test]
    fn sweep_removes_unflagged() {
        let store = RecordStore::new();
        for key in ["a", "b", "c"] {
            store.insert(key, record(&format!("{}.jpg", key)));
        }
        store.clear_flags();
        store.flag("a");
        store.flag("c");
        assert_eq!(store.unflagged_keys(), vec!["b".to_string()]);
        assert_eq!(store.retain_flagged(), vec!["b".to_string()]);
        assert_eq!(store.len(), 2);
    }
}
