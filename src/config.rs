//! Construction-time configuration for a [`Blackboard`](crate::Blackboard).
//!
//! A blackboard is configured once at construction: which storage variant
//! to use, the Redis connection parameters when the networked variant is
//! chosen, and an optional default snapshot path for `save`/`load`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::BlackboardError;

/// The storage backend variant a blackboard runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-shared in-memory mapping.
    Memory,
    /// Networked Redis cache (one hash per namespace).
    Redis,
}

impl FromStr for BackendKind {
    type Err = BlackboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "dictionary" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(BlackboardError::UnsupportedBackend {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Redis => write!(f, "redis"),
        }
    }
}

/// Connection parameters for the Redis backend.
///
/// `flush_on_close` clears the configured database index when the backend
/// is closed. This is a deliberately destructive convenience for ephemeral
/// and test usage; leave it off for anything whose contents you want to
/// outlive the blackboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis host address.
    pub host: String,
    /// Redis port number.
    pub port: u16,
    /// Redis database index.
    pub db_index: i64,
    /// Whether `close` flushes the configured database index.
    pub flush_on_close: bool,
    /// Connect/read/write timeout in seconds, applied per call.
    pub timeout_seconds: f64,
    /// Name of the Redis hash holding this blackboard's entries.
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db_index: 0,
            flush_on_close: true,
            timeout_seconds: 1.0,
            namespace: "blackboard".to_string(),
        }
    }
}

impl RedisConfig {
    /// The per-call socket timeout as a [`Duration`].
    ///
    /// Non-positive values collapse to one millisecond rather than zero;
    /// a zero timeout would block indefinitely on some platforms.
    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds > 0.0 {
            Duration::from_secs_f64(self.timeout_seconds)
        } else {
            Duration::from_millis(1)
        }
    }

    /// The connection URL for `redis::Client::open`.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db_index)
    }
}

/// Full blackboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackboardConfig {
    /// Which storage variant to use.
    pub backend: BackendKind,
    /// Redis parameters (ignored by the in-memory variant).
    pub redis: RedisConfig,
    /// Default path for `save`/`load` snapshots.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for BlackboardConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl BlackboardConfig {
    /// Configuration for the in-memory variant.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            redis: RedisConfig::default(),
            snapshot_path: None,
        }
    }

    /// Configuration for the Redis variant with the given parameters.
    pub fn redis(redis: RedisConfig) -> Self {
        Self {
            backend: BackendKind::Redis,
            redis,
            snapshot_path: None,
        }
    }

    /// Set the default snapshot path (builder style).
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }
}
