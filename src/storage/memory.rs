//! In-memory storage backend over a process-shared mapping.
//!
//! By default every [`MemoryBackend`] in the process attaches to the same
//! underlying map, so two blackboards choosing this variant observe each
//! other's raw values (their metadata stays private — see the facade).
//! The sharing relationship can also be made explicit by constructing the
//! backend with an injected [`SharedStore`] handle, which is what tests
//! do to stay isolated from the rest of the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::errors::{BlackboardError, Result};
use crate::storage::{snapshot, StorageBackend};

/// A lock-protected, reference-counted handle to a shared byte store.
pub type SharedStore = Arc<RwLock<HashMap<String, Bytes>>>;

/// The process-global store backing [`MemoryBackend::new`].
static PROCESS_STORE: Lazy<SharedStore> = Lazy::new(|| Arc::new(RwLock::new(HashMap::new())));

/// Storage backend holding values in a shared in-process mapping.
pub struct MemoryBackend {
    store: SharedStore,
}

impl MemoryBackend {
    /// Create a backend attached to the process-global shared store.
    pub fn new() -> Self {
        Self::with_store(PROCESS_STORE.clone())
    }

    /// Create a backend attached to an explicitly provided store handle.
    pub fn with_store(store: SharedStore) -> Self {
        Self { store }
    }

    /// A fresh, private store handle (not the process-global one).
    pub fn private_store() -> SharedStore {
        Arc::new(RwLock::new(HashMap::new()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        // The shared store outlives this handle; nothing to release.
        Ok(())
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<()> {
        self.store.write().insert(key.to_string(), data);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.store.read().get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        match self.store.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(BlackboardError::key_not_found(key)),
        }
    }

    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.store.read().contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.store.read().keys().cloned().collect())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let entries: Vec<(String, Bytes)> = {
            let store = self.store.read();
            store.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
        };
        snapshot::write(path, entries)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let entries = snapshot::read(path)?;
        let mut store = self.store.write();
        for (key, data) in entries {
            store.insert(key, data);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_backend() -> MemoryBackend {
        MemoryBackend::with_store(MemoryBackend::private_store())
    }

    #[test]
    fn test_set_get_overwrite() {
        let mut backend = private_backend();
        backend.set("k", Bytes::from_static(b"one")).unwrap();
        backend.set("k", Bytes::from_static(b"two")).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(Bytes::from_static(b"two")));
        assert_eq!(backend.get("missing").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_is_key_not_found() {
        let mut backend = private_backend();
        let err = backend.delete("ghost").unwrap_err();
        assert!(matches!(err, BlackboardError::KeyNotFound { ref key } if key == "ghost"));
    }

    #[test]
    fn test_has_and_keys() {
        let mut backend = private_backend();
        assert!(!backend.has("k").unwrap());
        backend.set("k", Bytes::from_static(b"v")).unwrap();
        assert!(backend.has("k").unwrap());
        assert_eq!(backend.keys().unwrap(), vec!["k".to_string()]);
    }

    #[test]
    fn test_store_is_shared_between_handles() {
        let store = MemoryBackend::private_store();
        let mut first = MemoryBackend::with_store(store.clone());
        let second = MemoryBackend::with_store(store);

        first.set("shared", Bytes::from_static(b"v")).unwrap();
        assert!(second.has("shared").unwrap());
    }

    #[test]
    fn test_save_then_load_into_fresh_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.snapshot");

        let mut backend = private_backend();
        backend.set("a", Bytes::from_static(b"1")).unwrap();
        backend.set("b", Bytes::from_static(b"2")).unwrap();
        backend.save(&path).unwrap();

        let mut restored = private_backend();
        restored.load(&path).unwrap();
        assert_eq!(restored.get("a").unwrap(), Some(Bytes::from_static(b"1")));
        assert_eq!(restored.get("b").unwrap(), Some(Bytes::from_static(b"2")));
    }

    #[test]
    fn test_concurrent_writers_on_shared_store() {
        use std::thread;

        let store = MemoryBackend::private_store();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    let mut backend = MemoryBackend::with_store(store);
                    for i in 0..50 {
                        backend
                            .set(&format!("t{}_{}", t, i), Bytes::from_static(b"x"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let backend = MemoryBackend::with_store(store);
        assert_eq!(backend.keys().unwrap().len(), 200);
    }
}
