use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::{KvStore, Result, StorageError};

/// Key-value store persisted as one JSON object file.
///
/// The whole key space is held in memory and rewritten on every `set`.
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the scope file at `path`, creating parent directories as needed.
    /// A missing file is an empty scope; nothing is written until the first `set`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| {
                StorageError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        tracing::debug!(
            target: "libris-storage",
            path = %path.display(),
            "opened storage file"
        );

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data).map_err(|source| {
            StorageError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, serialized).map_err(|e| StorageError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut data = self.data.write().map_err(|_| StorageError::Poisoned)?;
        let previous = data.insert(key.to_string(), value);

        if let Err(e) = self.persist(&data) {
            // Keep memory in step with what is on disk.
            match previous {
                Some(old) => data.insert(key.to_string(), old),
                None => data.remove(key),
            };
            return Err(e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_scope() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let store = FileStore::open(&path).unwrap();

        assert_eq!(store.get("library_books").unwrap(), None);
        assert_eq!(store.path(), path.as_path());
        assert!(!path.exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");

        let store = FileStore::open(&path).unwrap();
        store.set("borrowed_books", "[]".to_string()).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("borrowed_books").unwrap().as_deref(),
            Some("[]")
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        fs::write(&path, "not json").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
