//! The blackboard facade — public entry point composing a storage
//! backend with the per-key metadata registry.
//!
//! The facade owns the write-once/read-only policy, schema marshalling,
//! and observer dispatch; the backend only ever sees encoded bytes. Two
//! blackboards on the in-memory variant share raw storage but never
//! metadata: read-only flags and observers are private to the instance
//! that registered them.
//!
//! # Observer reentrancy
//!
//! Observers run synchronously, in registration order, during `update`.
//! An observer must not call back into the same blackboard for the same
//! key; all facade methods take `&mut self`, so the borrow checker
//! rejects straightforward reentrancy, and smuggling a second handle to
//! the same instance past it (e.g. via interior mutability) is outside
//! the supported contract.

pub mod meta;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::codec;
use crate::config::BlackboardConfig;
use crate::errors::{BlackboardError, Result};
use crate::schema::{MarshalMode, Schema};
use crate::storage::{create_backend, StorageBackend};

pub use meta::{MetaInfo, Observer, ObserverHandle};

/// The in-process blackboard key-value store.
pub struct Blackboard {
    backend: Box<dyn StorageBackend>,
    registry: HashMap<String, MetaInfo>,
    config: BlackboardConfig,
}

impl Blackboard {
    /// Construct a blackboard on the backend selected by the
    /// configuration.
    pub fn new(config: BlackboardConfig) -> Result<Self> {
        let backend = create_backend(&config)?;
        Ok(Self {
            backend,
            registry: HashMap::new(),
            config,
        })
    }

    /// Construct a blackboard over an explicitly provided backend.
    ///
    /// This is how tests inject a private in-memory store, and how an
    /// application makes the sharing relationship between instances
    /// explicit instead of relying on the process-global store.
    pub fn with_backend(
        mut backend: Box<dyn StorageBackend>,
        config: BlackboardConfig,
    ) -> Result<Self> {
        backend.setup()?;
        Ok(Self {
            backend,
            registry: HashMap::new(),
            config,
        })
    }

    /// Re-run backend setup (e.g. after a `close`).
    pub fn setup(&mut self) -> Result<()> {
        self.backend.setup()
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(BlackboardError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn meta(&self, key: &str) -> Result<&MetaInfo> {
        self.registry
            .get(key)
            .ok_or_else(|| BlackboardError::key_not_found(key))
    }

    fn meta_mut(&mut self, key: &str) -> Result<&mut MetaInfo> {
        self.registry
            .get_mut(key)
            .ok_or_else(|| BlackboardError::key_not_found(key))
    }

    // -----------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------

    /// Register a key and store its first value.
    ///
    /// `set` is write-once per key per blackboard lifetime: a second
    /// `set` on the same key fails with `KeyAlreadyExists` rather than
    /// overwriting. If a schema is given, the marshal mode (scalar or
    /// element-wise) is fixed now from the shape of `value` and applies
    /// to every later `update` of this key.
    ///
    /// On a backend failure the registry is left unchanged, so the call
    /// is safely retryable.
    pub fn set(
        &mut self,
        key: &str,
        value: Value,
        schema: Option<Arc<dyn Schema>>,
        read_only: bool,
    ) -> Result<()> {
        Self::validate_key(key)?;
        if self.registry.contains_key(key) {
            return Err(BlackboardError::KeyAlreadyExists {
                key: key.to_string(),
            });
        }

        let mode = MarshalMode::select(schema, &value);
        let stored = mode.marshal(&value)?;
        let data = codec::encode(&stored)?;
        self.backend.set(key, data)?;

        self.registry
            .insert(key.to_string(), MetaInfo::new(mode, read_only));
        log::debug!("set key '{}' (read_only: {})", key, read_only);
        Ok(())
    }

    /// Register a key from any serializable application value, without
    /// a schema.
    pub fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = codec::to_value(value)?;
        self.set(key, value, None, false)
    }

    /// Fetch the fully unmarshalled application value for a key.
    pub fn get(&self, key: &str) -> Result<Value> {
        let meta = self.meta(key)?;
        let raw = self.fetch_raw(key)?;
        meta.marshal_mode.unmarshal(&raw)
    }

    /// Fetch the backend's marshalled form for a key, skipping
    /// unmarshalling — a transport-friendly representation for external
    /// consumers.
    pub fn get_raw(&self, key: &str) -> Result<Value> {
        self.meta(key)?;
        self.fetch_raw(key)
    }

    /// Fetch and reconstruct a typed application value for a key.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        codec::from_value(self.get(key)?)
    }

    fn fetch_raw(&self, key: &str) -> Result<Value> {
        match self.backend.get(key)? {
            Some(data) => codec::decode(&data),
            None => {
                // Registered here but gone from the (possibly shared)
                // backend: a sibling instance deleted the raw value.
                log::warn!("key '{}' registered but absent from backend", key);
                Err(BlackboardError::key_not_found(key))
            }
        }
    }

    /// Replace the value of a registered key and notify its observers.
    ///
    /// Fails with `KeyNotFound` for unregistered keys and `ReadOnly` for
    /// keys registered read-only; in both cases, and on any backend
    /// failure, the stored value is untouched and no observer fires.
    pub fn update(&mut self, key: &str, value: Value) -> Result<()> {
        let meta = self.meta(key)?;
        if meta.read_only {
            return Err(BlackboardError::ReadOnly {
                key: key.to_string(),
            });
        }

        let stored = meta.marshal_mode.marshal(&value)?;
        let data = codec::encode(&stored)?;
        self.backend.set(key, data)?;

        log::debug!("updated key '{}'", key);
        self.meta(key)?.notify(&value);
        Ok(())
    }

    /// Replace the value of a registered key from a typed value.
    pub fn update_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = codec::to_value(value)?;
        self.update(key, value)
    }

    /// Remove a key: its backend value, its metadata, and (first) its
    /// observer list.
    pub fn drop_key(&mut self, key: &str) -> Result<()> {
        self.meta(key)?;
        match self.backend.delete(key) {
            Ok(()) => {}
            // The registry is the source of truth for existence; if a
            // sibling instance already removed the raw value, dropping
            // our registration still succeeds.
            Err(BlackboardError::KeyNotFound { .. }) => {
                log::warn!("key '{}' was already absent from backend", key);
            }
            Err(err) => return Err(err),
        }
        if let Some(mut meta) = self.registry.remove(key) {
            meta.clear_observers();
        }
        log::debug!("dropped key '{}'", key);
        Ok(())
    }

    /// Drop every registered key, best-effort.
    ///
    /// Each key is dropped through [`Blackboard::drop_key`], so per-key
    /// invariants keep applying. If some drops fail, the rest are still
    /// attempted and the first failure is reported once at the end.
    pub fn clear(&mut self) -> Result<()> {
        let keys = self.keys();
        let mut first_err = None;
        for key in keys {
            if let Err(err) = self.drop_key(&key) {
                log::warn!("clear: dropping key '{}' failed: {}", key, err);
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// The keys registered in this blackboard, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.registry.keys().cloned().collect()
    }

    /// Whether a key is registered in this blackboard.
    ///
    /// This asks the metadata registry — the client-facing source of
    /// truth — not the backend, so a sibling instance's raw values do
    /// not show up here.
    pub fn contains(&self, key: &str) -> bool {
        self.registry.contains_key(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no keys are registered.
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // -----------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------

    /// Register a change-observer for a key.
    ///
    /// The observer runs synchronously on every successful `update` of
    /// the key, receiving the new application-level value. The returned
    /// handle removes it again.
    pub fn register_observer<F>(&mut self, key: &str, observer: F) -> Result<ObserverHandle>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Ok(self.meta_mut(key)?.add_observer(Arc::new(observer)))
    }

    /// Remove the observer behind a handle. Unknown handles are a no-op.
    pub fn remove_observer(&mut self, key: &str, handle: ObserverHandle) -> Result<()> {
        self.meta_mut(key)?.remove_observer(handle);
        Ok(())
    }

    /// Remove every observer registered for a key.
    pub fn clear_observers(&mut self, key: &str) -> Result<()> {
        self.meta_mut(key)?.clear_observers();
        Ok(())
    }

    // -----------------------------------------------------------------
    // Persistence and lifecycle
    // -----------------------------------------------------------------

    fn snapshot_path(&self) -> Result<PathBuf> {
        self.config
            .snapshot_path
            .clone()
            .ok_or_else(|| BlackboardError::Snapshot {
                message: "no snapshot path configured".to_string(),
            })
    }

    /// Persist the backend's full contents to the configured snapshot
    /// path.
    pub fn save(&self) -> Result<()> {
        let path = self.snapshot_path()?;
        self.save_to(&path)
    }

    /// Persist the backend's full contents to the given path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.backend.save(path)
    }

    /// Restore the backend from the configured snapshot path and
    /// register every restored key.
    pub fn load(&mut self) -> Result<()> {
        let path = self.snapshot_path()?;
        self.load_from(&path)
    }

    /// Restore the backend from the given path and register every
    /// restored key.
    ///
    /// Restored keys get schema-less, writable metadata; existing
    /// registrations (and their observers) are kept as-is.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        self.backend.load(path)?;
        for key in self.backend.keys()? {
            self.registry
                .entry(key)
                .or_insert_with(|| MetaInfo::new(MarshalMode::None, false));
        }
        Ok(())
    }

    /// Release backend resources and forget all metadata.
    ///
    /// For the Redis variant this flushes the remote database index when
    /// `flush_on_close` is configured.
    pub fn close(&mut self) -> Result<()> {
        for meta in self.registry.values_mut() {
            meta.clear_observers();
        }
        self.registry.clear();
        self.backend.close()
    }
}

impl std::fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blackboard")
            .field("backend", &self.config.backend)
            .field("keys", &self.registry.len())
            .finish()
    }
}
