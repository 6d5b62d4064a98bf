//! Key-value persistence port.
//!
//! Values are whole JSON documents stored under a short key. The store and the
//! narrative library each own one key.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rustc_hash::FxHashMap;
use thiserror::Error;

const APP_DIR: &str = "puzzle-forge";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

pub trait Storage {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage, lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<FxHashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<platform data dir>/puzzle-forge`, or the working directory when the
    /// platform has none.
    pub fn default_location() -> Self {
        let dir = dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(APP_DIR));
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.read("gameProjects").unwrap().is_none());
        storage.write("gameProjects", "[]").unwrap();
        assert_eq!(storage.read("gameProjects").unwrap().as_deref(), Some("[]"));
        storage.remove("gameProjects").unwrap();
        storage.remove("gameProjects").unwrap();
        assert!(storage.read("gameProjects").unwrap().is_none());
    }

    #[test]
    fn file_storage_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path().join("nested"));
        storage.write("plotDescriptions", "[\"a\"]").unwrap();
        assert!(tmp.path().join("nested/plotDescriptions.json").is_file());
        assert_eq!(storage.read("plotDescriptions").unwrap().as_deref(), Some("[\"a\"]"));
        storage.remove("plotDescriptions").unwrap();
        assert!(storage.read("plotDescriptions").unwrap().is_none());
    }

    #[test]
    fn file_storage_rejects_path_keys() {
        let tmp = TempDir::new().unwrap();
        let storage = FileStorage::new(tmp.path());
        assert!(matches!(
            storage.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
