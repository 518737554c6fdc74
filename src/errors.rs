//! Error types shared across the blackboard crate.
//!
//! Every failure a caller can observe is a distinguished variant of
//! [`BlackboardError`]. The facade never swallows an error and never
//! signals a backend-availability problem through a sentinel return
//! value: "operation logically rejected" (e.g. [`BlackboardError::ReadOnly`])
//! and "infrastructure unavailable" ([`BlackboardError::BackendUnavailable`])
//! stay structurally distinct.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlackboardError>;

/// The error taxonomy for all blackboard operations.
#[derive(Debug, Error)]
pub enum BlackboardError {
    /// The key is empty or otherwise not a usable identifier.
    #[error("invalid key {key:?}: keys must be non-empty strings")]
    InvalidKey { key: String },

    /// `set` was called for a key that is already registered.
    #[error("key '{key}' already exists in blackboard")]
    KeyAlreadyExists { key: String },

    /// The key is not registered in this blackboard (or, at the storage
    /// layer, absent from the backend on delete).
    #[error("key '{key}' does not exist in blackboard")]
    KeyNotFound { key: String },

    /// `update` was called for a key registered as read-only.
    #[error("cannot update read-only key '{key}'")]
    ReadOnly { key: String },

    /// An unknown backend variant name was requested.
    #[error("unsupported backend variant '{name}' (expected 'memory' or 'redis')")]
    UnsupportedBackend { name: String },

    /// The value could not be encoded into a storable form.
    #[error("serialization failed: {message}")]
    Serialization { message: String },

    /// Stored or snapshot bytes could not be decoded back into a value.
    #[error("corrupt data: {message}")]
    CorruptData { message: String },

    /// The networked backend could not be reached (connection refused,
    /// dropped, or timed out). The registry is left unchanged when this
    /// surfaces from `set` or `update`, so the call is safely retryable.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Reading or writing a snapshot file failed at the I/O level.
    #[error("snapshot I/O failed: {message}")]
    Snapshot { message: String },
}

impl BlackboardError {
    /// Build a [`BlackboardError::KeyNotFound`] for the given key.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Build a [`BlackboardError::Serialization`] from any displayable cause.
    pub fn serialization(cause: impl std::fmt::Display) -> Self {
        Self::Serialization {
            message: cause.to_string(),
        }
    }

    /// Build a [`BlackboardError::CorruptData`] from any displayable cause.
    pub fn corrupt(cause: impl std::fmt::Display) -> Self {
        Self::CorruptData {
            message: cause.to_string(),
        }
    }
}
