//! Key-value persistence substrate.
//!
//! The catalog only ever needs `get` and `set` on string keys holding
//! serialized JSON. Two backends are provided: a volatile in-memory map and
//! a single JSON file that stands in for a browser storage scope.

mod error;
mod file;
mod memory;

use std::sync::Arc;

use libris_kernel::settings::{StorageBackend, StorageSettings};

pub use error::{Result, StorageError};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Synchronous string key-value store.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<()>;
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Open the backend selected by configuration.
pub fn open_store(settings: &StorageSettings) -> Result<Box<dyn KvStore>> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::info!(target: "libris-storage", "using in-memory storage");
            Ok(Box::new(MemoryStore::new()))
        }
        StorageBackend::File => {
            let store = FileStore::open(&settings.path)?;
            tracing::info!(
                target: "libris-storage",
                path = %store.path().display(),
                "using file storage"
            );
            Ok(Box::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_memory_backend() {
        let settings = StorageSettings {
            backend: StorageBackend::Memory,
            ..StorageSettings::default()
        };
        let store = open_store(&settings).unwrap();
        store.set("k", "v".to_string()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn open_file_backend() {
        let dir = TempDir::new().unwrap();
        let settings = StorageSettings {
            backend: StorageBackend::File,
            path: dir.path().join("scope.json"),
            ..StorageSettings::default()
        };
        let store = open_store(&settings).unwrap();
        assert_eq!(store.get("library_books").unwrap(), None);
    }
}
