//! JSON file persistence for graphs, the policy table and the feedback log.
//!
//! Every store is written through: each mutation is followed by a full
//! rewrite of the structure. That bounds durability risk (a crash loses at
//! most the mutation in flight) at the cost of O(size) I/O per mutation.
//!
//! Loading never fails. A missing file yields the default (empty) value; an
//! unreadable or corrupt file does too, with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A JSON document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, falling back to `T::default()` if the file is
    /// missing, unreadable or malformed.
    pub fn load_or_default<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no stored state, starting empty");
                return T::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read stored state, starting empty");
                return T::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt stored state, starting empty");
                T::default()
            }
        }
    }

    /// Serialize and atomically replace the document (write temp file, rename).
    pub fn save<T: Serialize>(&self, value: &T) -> StoreResult<()> {
        let path_str = self.path.display().to_string();
        let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialization {
            path: path_str.clone(),
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: path_str,
            source,
        })
    }
}

/// Write-through target: either a file or nothing (memory-only session).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteThrough {
    file: Option<JsonFile>,
}

impl WriteThrough {
    /// No persistence: every write is a no-op.
    pub fn memory_only() -> Self {
        Self { file: None }
    }

    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(JsonFile::new(path)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(JsonFile::path)
    }

    /// Load initial state (default when memory-only).
    pub fn load<T>(&self) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.file
            .as_ref()
            .map(|file| file.load_or_default())
            .unwrap_or_default()
    }

    /// Save, propagating failures.
    pub fn save<T: Serialize>(&self, value: &T) -> StoreResult<()> {
        match &self.file {
            Some(file) => file.save(value),
            None => Ok(()),
        }
    }

    /// Save after a mutation. Failures are logged and the in-memory state is
    /// kept; the next successful save restores durability.
    pub fn write<T: Serialize>(&self, value: &T) {
        if let Err(e) = self.save(value) {
            tracing::warn!(error = %e, "persistence write failed, continuing in memory");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("absent.json"));
        let value: Vec<u32> = file.load_or_default();
        assert!(value.is_empty());
    }

    #[test]
    fn corrupt_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let value: BTreeMap<String, f64> = JsonFile::new(&path).load_or_default();
        assert!(value.is_empty());
    }

    #[test]
    fn save_creates_parent_dirs_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("nested/deeper/state.json"));
        let mut value = BTreeMap::new();
        value.insert("tigre".to_string(), 1.5);
        file.save(&value).unwrap();
        let loaded: BTreeMap<String, f64> = file.load_or_default();
        assert_eq!(loaded, value);
        assert!(!dir.path().join("nested/deeper/state.json.tmp").exists());
    }

    #[test]
    fn memory_only_never_touches_disk() {
        let sink = WriteThrough::memory_only();
        assert!(sink.path().is_none());
        sink.save(&vec![1, 2, 3]).unwrap();
        let loaded: Vec<u32> = sink.load();
        assert!(loaded.is_empty());
    }

    #[test]
    fn failed_write_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("occupied");
        fs::create_dir_all(path.join("child")).unwrap();
        let sink = WriteThrough::to_file(&path);
        assert!(sink.save(&1u8).is_err());
        sink.write(&1u8);
    }
}
