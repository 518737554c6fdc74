//! Serialization codec — value ⇄ byte-representation conversion.
//!
//! The codec is stateless and backend-agnostic: the same encoded form is
//! writable to either storage variant and readable by either, which is
//! what makes cross-backend save/load migration possible. Values cross
//! this boundary as [`serde_json::Value`]; application-defined types get
//! in and out through [`to_value`]/[`from_value`], so any type deriving
//! `Serialize`/`Deserialize` round-trips with equality preserved.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{BlackboardError, Result};

/// Encode a value into its storable byte form.
///
/// Fails with [`BlackboardError::Serialization`] if the value cannot be
/// represented (the JSON layer rejects e.g. maps with non-string keys).
pub fn encode(value: &Value) -> Result<Bytes> {
    let raw = serde_json::to_vec(value).map_err(BlackboardError::serialization)?;
    Ok(Bytes::from(raw))
}

/// Decode storable bytes back into a value.
///
/// Fails with [`BlackboardError::CorruptData`] on malformed or
/// foreign-origin bytes.
pub fn decode(data: &[u8]) -> Result<Value> {
    serde_json::from_slice(data).map_err(BlackboardError::corrupt)
}

/// Convert an application-defined value into the codec's value form.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(BlackboardError::serialization)
}

/// Reconstruct an application-defined value from the codec's value form.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(BlackboardError::corrupt)
}
