//! # Key-Value Storage
//!
//! Best-effort persistence for page state (carts, preferences, ...).
//!
//! ```text
//! KeyValueStore ── prefix + key ──> StorageBackend
//!     get<T>  → None on absence, decode failure or backend error
//!     set<T>  → false (logged) on encode or backend failure
//!     clear   → removes only keys under the prefix
//! ```
//!
//! Values are stored as JSON text. Nothing here is durable beyond what the
//! chosen backend offers.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AsxError, AsxResult};

/// Raw string storage.
pub trait StorageBackend: Send + Sync {
    /// Reads a raw value.
    ///
    /// # Errors
    ///
    /// Backend-specific read failures.
    fn read(&self, key: &str) -> AsxResult<Option<String>>;

    /// Writes a raw value.
    ///
    /// # Errors
    ///
    /// Backend-specific write failures.
    fn write(&self, key: &str, value: &str) -> AsxResult<()>;

    /// Deletes a key. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Backend-specific write failures.
    fn delete(&self, key: &str) -> AsxResult<()>;

    /// Every stored key.
    ///
    /// # Errors
    ///
    /// Backend-specific read failures.
    fn keys(&self) -> AsxResult<Vec<String>>;
}

// ============================================================================
// MEMORY
// ============================================================================

/// Volatile in-process backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> AsxResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> AsxResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> AsxResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> AsxResult<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

// ============================================================================
// JSON FILE
// ============================================================================

/// Backend persisted as a single JSON object on disk.
///
/// The whole map is cached in memory and rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileBackend {
    /// Opens (or lazily creates) the file at `path`.
    ///
    /// A missing file starts empty. A corrupt file is logged and also
    /// starts empty; it is overwritten on the next write.
    ///
    /// # Errors
    ///
    /// [`AsxError::Io`](crate::AsxError::Io) if the file exists but cannot
    /// be read.
    pub fn open(path: impl Into<PathBuf>) -> AsxResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "storage file opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> AsxResult<()> {
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl StorageBackend for JsonFileBackend {
    fn read(&self, key: &str) -> AsxResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> AsxResult<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        // The cache only changes once the file holds the new map.
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn delete(&self, key: &str) -> AsxResult<()> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> AsxResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Namespaced JSON key-value store.
pub struct KeyValueStore {
    backend: Box<dyn StorageBackend>,
    prefix: String,
}

impl KeyValueStore {
    /// Wraps a backend; every key is stored as `prefix + key`.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    /// In-memory store.
    #[must_use]
    pub fn in_memory(prefix: impl Into<String>) -> Self {
        Self::new(Box::new(MemoryBackend::new()), prefix)
    }

    /// Key namespace.
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Underlying backend, for un-namespaced access.
    #[must_use]
    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Reads and decodes a value.
    ///
    /// Absent keys, empty values, undecodable values and backend errors all
    /// read as `None`.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full = self.full_key(key);
        let raw = match self.backend.read(&full) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                warn!(key = %full, error = %err, "storage read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(key = %full, error = %err, "stored value does not decode");
                None
            }
        }
    }

    /// Encodes and writes a value.
    ///
    /// # Returns
    ///
    /// `false` if the write failed; the failure is logged and otherwise
    /// swallowed.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let full = self.full_key(key);
        let outcome = serde_json::to_string(value)
            .map_err(AsxError::from)
            .and_then(|raw| self.backend.write(&full, &raw));
        match outcome {
            Ok(()) => true,
            Err(err) => {
                warn!(key = %full, error = %err, "storage write failed");
                false
            }
        }
    }

    /// Deletes a key.
    pub fn remove(&self, key: &str) {
        let full = self.full_key(key);
        if let Err(err) = self.backend.delete(&full) {
            warn!(key = %full, error = %err, "storage delete failed");
        }
    }

    /// Deletes every key under the prefix and leaves the rest alone.
    ///
    /// # Returns
    ///
    /// Number of keys removed.
    pub fn clear(&self) -> usize {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                warn!(error = %err, "storage key listing failed");
                return 0;
            }
        };
        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(&self.prefix)) {
            match self.backend.delete(key) {
                Ok(()) => removed += 1,
                Err(err) => warn!(key = %key, error = %err, "storage delete failed"),
            }
        }
        removed
    }
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("asx_storage_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn test_roundtrip_and_absence() {
        let store = KeyValueStore::in_memory("asx:");
        assert_eq!(store.get::<u32>("missing"), None);

        assert!(store.set("cart", &vec!["p1", "p2"]));
        assert_eq!(store.get::<Vec<String>>("cart"), Some(vec!["p1".into(), "p2".into()]));
        assert_eq!(store.backend().read("asx:cart").unwrap().as_deref(), Some(r#"["p1","p2"]"#));

        store.remove("cart");
        assert_eq!(store.get::<Vec<String>>("cart"), None);
    }

    #[test]
    fn test_corrupt_value_reads_as_none() {
        let store = KeyValueStore::in_memory("asx:");
        store.backend().write("asx:broken", "{not json").unwrap();
        store.backend().write("asx:empty", "").unwrap();
        assert_eq!(store.get::<HashMap<String, u32>>("broken"), None);
        assert_eq!(store.get::<u32>("empty"), None);

        assert!(store.set("count", &3));
        assert_eq!(store.get::<String>("count"), None);
    }

    #[test]
    fn test_clear_only_touches_prefix() {
        let store = KeyValueStore::in_memory("asx:");
        store.set("a", &1);
        store.set("b", &2);
        store.backend().write("other:a", "1").unwrap();
        store.backend().write("asxa", "1").unwrap();

        assert_eq!(store.clear(), 2);
        assert_eq!(store.backend().keys().unwrap(), vec!["asxa".to_string(), "other:a".to_string()]);
    }

    #[test]
    fn test_json_file_persists() {
        let path = temp_file("persist");
        let _ = fs::remove_file(&path);
        {
            let store = KeyValueStore::new(Box::new(JsonFileBackend::open(&path).unwrap()), "asx:");
            assert!(store.set("score", &42));
        }
        let reopened = KeyValueStore::new(Box::new(JsonFileBackend::open(&path).unwrap()), "asx:");
        assert_eq!(reopened.get::<u32>("score"), Some(42));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_file_corrupt_starts_empty() {
        let path = temp_file("corrupt");
        fs::write(&path, "[1, 2").unwrap();
        let backend = JsonFileBackend::open(&path).unwrap();
        assert!(backend.keys().unwrap().is_empty());
        backend.write("k", "\"v\"").unwrap();
        assert_eq!(JsonFileBackend::open(&path).unwrap().read("k").unwrap().as_deref(), Some("\"v\""));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_failed_write_is_swallowed() {
        let dir = temp_file("as_dir");
        let _ = fs::remove_file(&dir);
        fs::create_dir_all(&dir).unwrap();
        // Writing the map to a directory path fails.
        let mut entries = BTreeMap::new();
        entries.insert("asx:k".to_string(), "0".to_string());
        let backend = JsonFileBackend {
            path: dir.clone(),
            entries: Mutex::new(entries),
        };
        let store = KeyValueStore::new(Box::new(backend), "asx:");
        assert!(!store.set("k", &1));
        assert_eq!(store.get::<i32>("k"), Some(0));
        assert!(!store.set("fresh", &2));
        assert_eq!(store.get::<i32>("fresh"), None);
        store.remove("k");
        assert_eq!(store.get::<i32>("k"), Some(0));
        fs::remove_dir_all(&dir).unwrap();
    }
}
