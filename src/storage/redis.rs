//! Redis storage backend — adapts a remote hash-oriented cache to the
//! uniform backend capability set.
//!
//! All entries for one blackboard namespace live in a single Redis hash,
//! so distinct namespaces on the same database index do not collide. A
//! connection is obtained per operation with the configured timeout, and
//! every transport failure funnels through one translation point
//! ([`RedisBackend::unavailable`]) so callers only ever see
//! `BackendUnavailable`, never a client-library error type.

use std::collections::HashMap;
use std::path::Path;

use bytes::Bytes;
use redis::Commands;

use crate::config::RedisConfig;
use crate::errors::{BlackboardError, Result};
use crate::storage::{snapshot, StorageBackend};

/// Storage backend over a remote Redis instance.
pub struct RedisBackend {
    config: RedisConfig,
    client: Option<redis::Client>,
}

impl RedisBackend {
    /// Create a backend for the given connection parameters.
    ///
    /// No connection is attempted here; the first operation (or an
    /// explicit [`RedisBackend::ping`]) is what talks to the server.
    pub fn new(config: RedisConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// The single transport-error translation boundary.
    fn unavailable(err: redis::RedisError) -> BlackboardError {
        BlackboardError::BackendUnavailable {
            message: err.to_string(),
        }
    }

    /// Obtain a fresh connection with the configured timeouts applied.
    fn connection(&self) -> Result<redis::Connection> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| BlackboardError::BackendUnavailable {
                message: "backend is closed".to_string(),
            })?;
        let timeout = self.config.timeout();
        let conn = client
            .get_connection_with_timeout(timeout)
            .map_err(Self::unavailable)?;
        conn.set_read_timeout(Some(timeout))
            .map_err(Self::unavailable)?;
        conn.set_write_timeout(Some(timeout))
            .map_err(Self::unavailable)?;
        Ok(conn)
    }

    /// Whether the server currently answers a PING.
    pub fn ping(&self) -> bool {
        let Ok(mut conn) = self.connection() else {
            return false;
        };
        redis::cmd("PING").query::<String>(&mut conn).is_ok()
    }
}

impl StorageBackend for RedisBackend {
    fn setup(&mut self) -> Result<()> {
        let client = redis::Client::open(self.config.url()).map_err(Self::unavailable)?;
        self.client = Some(client);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.client.is_some() && self.config.flush_on_close {
            log::debug!(
                "flushing redis db {} on close (flush_on_close is set)",
                self.config.db_index
            );
            let mut conn = self.connection()?;
            redis::cmd("FLUSHDB")
                .query::<()>(&mut conn)
                .map_err(Self::unavailable)?;
        }
        self.client = None;
        Ok(())
    }

    fn set(&mut self, key: &str, data: Bytes) -> Result<()> {
        let mut conn = self.connection()?;
        let _: () = conn
            .hset(&self.config.namespace, key, data.as_ref())
            .map_err(Self::unavailable)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut conn = self.connection()?;
        let data: Option<Vec<u8>> = conn
            .hget(&self.config.namespace, key)
            .map_err(Self::unavailable)?;
        Ok(data.map(Bytes::from))
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let removed: i64 = conn
            .hdel(&self.config.namespace, key)
            .map_err(Self::unavailable)?;
        if removed > 0 {
            Ok(())
        } else {
            Err(BlackboardError::key_not_found(key))
        }
    }

    fn has(&self, key: &str) -> Result<bool> {
        // Absence is a legitimate `false`, never an error. Only a failed
        // round trip to the server surfaces as `BackendUnavailable`.
        let mut conn = self.connection()?;
        conn.hexists(&self.config.namespace, key)
            .map_err(Self::unavailable)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.connection()?;
        conn.hkeys(&self.config.namespace)
            .map_err(Self::unavailable)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let mut conn = self.connection()?;
        let all: HashMap<String, Vec<u8>> = conn
            .hgetall(&self.config.namespace)
            .map_err(Self::unavailable)?;
        snapshot::write(
            path,
            all.into_iter().map(|(key, data)| (key, Bytes::from(data))),
        )
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let entries = snapshot::read(path)?;
        let mut conn = self.connection()?;
        for (key, data) in entries {
            let _: () = conn
                .hset(&self.config.namespace, &key, data.as_ref())
                .map_err(Self::unavailable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> RedisConfig {
        RedisConfig {
            // Port 1 is practically never a Redis server; connection is
            // refused immediately rather than waiting out the timeout.
            port: 1,
            timeout_seconds: 0.25,
            flush_on_close: false,
            ..RedisConfig::default()
        }
    }

    #[test]
    fn test_unreachable_server_surfaces_backend_unavailable() {
        let mut backend = RedisBackend::new(unreachable_config());
        backend.setup().unwrap();

        let err = backend.set("k", Bytes::from_static(b"v")).unwrap_err();
        assert!(matches!(err, BlackboardError::BackendUnavailable { .. }));

        let err = backend.has("k").unwrap_err();
        assert!(matches!(err, BlackboardError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_closed_backend_is_unavailable_not_silent() {
        let mut backend = RedisBackend::new(unreachable_config());
        let err = backend.set("k", Bytes::from_static(b"v")).unwrap_err();
        assert!(matches!(err, BlackboardError::BackendUnavailable { .. }));
        assert!(!backend.ping());
    }

    // The tests below need a live Redis on localhost:6379 (e.g.
    // `docker run -p 6379:6379 redis`): `cargo test -- --ignored`.

    fn live_config() -> RedisConfig {
        RedisConfig {
            namespace: "blackboard_test".to_string(),
            flush_on_close: false,
            ..RedisConfig::default()
        }
    }

    #[test]
    #[ignore]
    fn test_live_set_get_delete_has() {
        let mut backend = RedisBackend::new(live_config());
        backend.setup().unwrap();
        assert!(backend.ping());

        backend.set("live_k", Bytes::from_static(b"v1")).unwrap();
        assert_eq!(
            backend.get("live_k").unwrap(),
            Some(Bytes::from_static(b"v1"))
        );
        assert!(backend.has("live_k").unwrap());

        backend.delete("live_k").unwrap();
        assert!(!backend.has("live_k").unwrap());
        let err = backend.delete("live_k").unwrap_err();
        assert!(matches!(err, BlackboardError::KeyNotFound { .. }));
    }

    #[test]
    #[ignore]
    fn test_live_save_then_memory_load() {
        use crate::storage::MemoryBackend;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redis.snapshot");

        let mut backend = RedisBackend::new(live_config());
        backend.setup().unwrap();
        backend.set("migrate", Bytes::from_static(b"42")).unwrap();
        backend.save(&path).unwrap();
        backend.delete("migrate").unwrap();

        let mut restored = MemoryBackend::with_store(MemoryBackend::private_store());
        restored.load(&path).unwrap();
        assert_eq!(
            restored.get("migrate").unwrap(),
            Some(Bytes::from_static(b"42"))
        );
    }
}
