//! Storage backends for the blackboard.
//!
//! A backend is a byte-oriented key/value store behind the
//! [`StorageBackend`] trait. Backends are value-type-agnostic: the only
//! form they ever touch is the codec's encoded bytes. Two variants ship:
//! the process-shared [`MemoryBackend`](memory::MemoryBackend) and the
//! Redis-backed [`RedisBackend`](redis::RedisBackend). Both persist to
//! the same snapshot format, so a save from one variant loads into the
//! other.

pub mod memory;
pub mod redis;
pub mod snapshot;

use std::path::Path;

use bytes::Bytes;

use crate::config::{BackendKind, BlackboardConfig};
use crate::errors::Result;

pub use self::memory::{MemoryBackend, SharedStore};
pub use self::redis::RedisBackend;

/// The uniform capability set every storage backend satisfies.
///
/// Key semantics at this layer are deliberately simpler than the facade's:
/// `set` always overwrites, and existence checks return `Ok(false)` on
/// legitimate absence. Write-once and read-only policy live in the
/// facade's metadata registry, not here.
pub trait StorageBackend: Send {
    /// Prepare the backend for use.
    fn setup(&mut self) -> Result<()>;

    /// Release backend resources. For the Redis variant this optionally
    /// flushes the configured database index.
    fn close(&mut self) -> Result<()>;

    /// Store bytes under a key, overwriting any previous value.
    fn set(&mut self, key: &str, data: Bytes) -> Result<()>;

    /// Fetch the bytes stored under a key, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Remove a key. Fails with `KeyNotFound` if the key is absent.
    fn delete(&mut self, key: &str) -> Result<()>;

    /// Whether a key is present. Absence is `Ok(false)`, never an error;
    /// an `Err` always means the backend itself could not answer.
    fn has(&self, key: &str) -> Result<bool>;

    /// All keys currently present in the backend.
    fn keys(&self) -> Result<Vec<String>>;

    /// Persist the backend's full contents to a snapshot file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore the backend's contents from a snapshot file, overwriting
    /// entries whose keys collide.
    fn load(&mut self, path: &Path) -> Result<()>;
}

/// Construct the backend selected by the configuration.
pub fn create_backend(config: &BlackboardConfig) -> Result<Box<dyn StorageBackend>> {
    let mut backend: Box<dyn StorageBackend> = match config.backend {
        BackendKind::Memory => Box::new(MemoryBackend::new()),
        BackendKind::Redis => Box::new(RedisBackend::new(config.redis.clone())),
    };
    backend.setup()?;
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_backend() {
        let backend = create_backend(&BlackboardConfig::memory()).unwrap();
        // The shared store may already hold entries from other instances
        // in this process; creation itself must not fail.
        assert!(backend.keys().is_ok());
    }
}
