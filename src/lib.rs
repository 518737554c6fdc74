//! # blackboard
//!
//! An in-process "blackboard" key-value store: a uniform facade over
//! interchangeable storage backends (a process-shared in-memory mapping
//! and a networked Redis cache), augmented with per-key metadata
//! (schema marshalling, read-only flags, change observers) and generic
//! value serialization so arbitrary structured values can be stored,
//! retrieved, and migrated between backends.
//!
//! ```no_run
//! use blackboard::{Blackboard, BlackboardConfig};
//! use serde_json::json;
//!
//! let mut board = Blackboard::new(BlackboardConfig::memory())?;
//! board.set("user", json!({"name": "G.Ted"}), None, false)?;
//! board.update("user", json!({"name": "Ted2"}))?;
//! assert_eq!(board.get("user")?["name"], "Ted2");
//! # Ok::<(), blackboard::BlackboardError>(())
//! ```

pub mod blackboard;
pub mod codec;
pub mod config;
pub mod errors;
pub mod schema;
pub mod storage;

pub use blackboard::{Blackboard, MetaInfo, Observer, ObserverHandle};
pub use config::{BackendKind, BlackboardConfig, RedisConfig};
pub use errors::{BlackboardError, Result};
pub use schema::{FieldsSchema, MarshalMode, Schema, TypedSchema};
pub use storage::{MemoryBackend, RedisBackend, SharedStore, StorageBackend};
