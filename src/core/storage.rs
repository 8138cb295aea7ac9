//! # Local Persistence
//!
//! JSON blobs under namespaced keys, the terminal stand-in for browser
//! `localStorage`.
//!
//! ```text
//! LocalStore::save("trips", &trips)
//!      │  key  → "globemate_trips"
//!      │  data → serde_json
//!      ▼
//! KeyValueStore (trait)
//!      ├── FileStore    <dir>/globemate_trips.json  (write .tmp, rename)
//!      └── MemoryStore  HashMap, for tests
//! ```
//!
//! Controllers receive a cloned `LocalStore` at construction; the backend is
//! shared behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const KEY_PREFIX: &str = "globemate_";

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Serialize(e) => write!(f, "storage serialization error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

// ============================================================================
// Backends
// ============================================================================

/// A string key-value backend.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        atomic_write(&self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

/// Write to a sibling `.tmp` file, then rename over the target.
fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }
}

// ============================================================================
// LocalStore
// ============================================================================

/// Typed JSON access to a backend, with every key namespaced by
/// [`KEY_PREFIX`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    pub fn on_disk(dir: impl Into<PathBuf>) -> io::Result<Self> {
        Ok(Self::new(Arc::new(FileStore::new(dir)?)))
    }

    fn namespaced(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(data).map_err(StorageError::Serialize)?;
        self.backend.set(&Self::namespaced(key), &json)?;
        debug!("Saved {} ({} bytes)", Self::namespaced(key), json.len());
        Ok(())
    }

    /// `None` when the key is absent, unreadable, or holds data of another
    /// shape. The latter two are logged.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let namespaced = Self::namespaced(key);
        let raw = match self.backend.get(&namespaced) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read {namespaced}: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Ignoring corrupt {namespaced}: {e}");
                None
            }
        }
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(&Self::namespaced(key))
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        name: String,
        checked: bool,
    }

    #[test]
    fn test_memory_round_trip() {
        let store = LocalStore::in_memory();
        let items = vec![Item { name: "Passport".into(), checked: true }];
        store.save("packingList", &items).unwrap();
        let loaded: Vec<Item> = store.load("packingList").unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn test_missing_key_loads_none() {
        let store = LocalStore::in_memory();
        assert!(store.load::<Vec<Item>>("trips").is_none());
    }

    #[test]
    fn test_keys_are_namespaced() {
        let backend = Arc::new(MemoryStore::default());
        let store = LocalStore::new(backend.clone());
        store.save("trips", &Vec::<Item>::new()).unwrap();
        assert_eq!(backend.get("globemate_trips").unwrap().as_deref(), Some("[]"));
        assert!(backend.get("trips").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_data_loads_none() {
        let backend = Arc::new(MemoryStore::default());
        backend.set("globemate_trips", "{not json").unwrap();
        let store = LocalStore::new(backend);
        assert!(store.load::<Vec<Item>>("trips").is_none());
    }

    #[test]
    fn test_file_store_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::on_disk(dir.path()).unwrap();
        store.save("reminders", &vec![1, 2, 3]).unwrap();

        let path = dir.path().join("globemate_reminders.json");
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1,2,3]");
        assert!(!dir.path().join("globemate_reminders.tmp").exists());

        let reopened = LocalStore::on_disk(dir.path()).unwrap();
        assert_eq!(reopened.load::<Vec<i32>>("reminders"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::on_disk(dir.path()).unwrap();
        assert!(store.remove("documents").is_ok());
        store.save("documents", &Vec::<Item>::new()).unwrap();
        store.remove("documents").unwrap();
        assert!(store.load::<Vec<Item>>("documents").is_none());
    }
}
