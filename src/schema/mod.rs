//! Schema marshalling — application-level shape conversion.
//!
//! A [`Schema`] governs the *application-level shape* of a stored value
//! (object ⇄ plain keyed mapping), while the [`codec`](crate::codec)
//! governs the *byte representation*. The two are orthogonal: the codec
//! never knows whether a schema was applied.
//!
//! Which marshalling applies to a key is decided once, at `set` time, and
//! recorded in the key's metadata as a [`MarshalMode`]: no marshalling,
//! scalar marshalling, or element-wise marshalling for sequence-shaped
//! values.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{BlackboardError, Result};

/// A marshalling contract between an application value and its
/// backend-storable shape.
///
/// `marshal` produces the transport-friendly form that is encoded and
/// stored; `unmarshal` reconstructs the application form on read.
pub trait Schema: Send + Sync {
    /// Convert an application value into its storable shape.
    fn marshal(&self, value: &Value) -> Result<Value>;

    /// Convert a storable shape back into the application value.
    fn unmarshal(&self, raw: &Value) -> Result<Value>;
}

/// How a key's values are marshalled, fixed when the key is first `set`.
#[derive(Clone)]
pub enum MarshalMode {
    /// No schema: values pass straight through to the codec.
    None,
    /// A single value marshalled through the schema.
    Scalar(Arc<dyn Schema>),
    /// A sequence whose elements are each marshalled through the schema.
    Sequence(Arc<dyn Schema>),
}

impl std::fmt::Debug for MarshalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "MarshalMode::None"),
            Self::Scalar(_) => write!(f, "MarshalMode::Scalar"),
            Self::Sequence(_) => write!(f, "MarshalMode::Sequence"),
        }
    }
}

impl MarshalMode {
    /// Select the mode for a key from the optional schema and the shape
    /// of the first value written to it.
    pub fn select(schema: Option<Arc<dyn Schema>>, value: &Value) -> Self {
        match schema {
            None => Self::None,
            Some(schema) if value.is_array() => Self::Sequence(schema),
            Some(schema) => Self::Scalar(schema),
        }
    }

    /// Marshal an application value into its storable shape.
    pub fn marshal(&self, value: &Value) -> Result<Value> {
        match self {
            Self::None => Ok(value.clone()),
            Self::Scalar(schema) => schema.marshal(value),
            Self::Sequence(schema) => match value {
                Value::Array(items) => {
                    let marshalled: Result<Vec<Value>> =
                        items.iter().map(|item| schema.marshal(item)).collect();
                    Ok(Value::Array(marshalled?))
                }
                other => Err(BlackboardError::Serialization {
                    message: format!(
                        "sequence-marshalled key expects an array, got {}",
                        kind_name(other)
                    ),
                }),
            },
        }
    }

    /// Unmarshal a storable shape back into the application value.
    pub fn unmarshal(&self, raw: &Value) -> Result<Value> {
        match self {
            Self::None => Ok(raw.clone()),
            Self::Scalar(schema) => schema.unmarshal(raw),
            Self::Sequence(schema) => match raw {
                Value::Array(items) => {
                    let unmarshalled: Result<Vec<Value>> =
                        items.iter().map(|item| schema.unmarshal(item)).collect();
                    Ok(Value::Array(unmarshalled?))
                }
                other => Err(BlackboardError::corrupt(format!(
                    "sequence-marshalled key holds {}, expected an array",
                    kind_name(other)
                ))),
            },
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A schema that validates and normalizes values through an application
/// type `T`.
///
/// `marshal` parses the incoming value as `T` and re-serializes it, so
/// anything that does not fit `T` is rejected before it reaches storage,
/// and extraneous fields are stripped. `unmarshal` applies the same
/// normalization on the way out.
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Create a shareable schema handle for type `T`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            _marker: PhantomData,
        })
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: Serialize + DeserializeOwned,
{
    fn marshal(&self, value: &Value) -> Result<Value> {
        let typed: T =
            serde_json::from_value(value.clone()).map_err(BlackboardError::serialization)?;
        serde_json::to_value(&typed).map_err(BlackboardError::serialization)
    }

    fn unmarshal(&self, raw: &Value) -> Result<Value> {
        let typed: T = serde_json::from_value(raw.clone()).map_err(BlackboardError::corrupt)?;
        serde_json::to_value(&typed).map_err(BlackboardError::corrupt)
    }
}

/// A schema that projects an object down to a fixed set of fields.
///
/// The storable shape keeps only the listed fields; dropped fields are
/// gone for good, so `unmarshal` is the identity on the projected form.
pub struct FieldsSchema {
    fields: Vec<String>,
}

impl FieldsSchema {
    /// Create a projection schema keeping the given fields.
    pub fn new<I, S>(fields: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self {
            fields: fields.into_iter().map(Into::into).collect(),
        })
    }
}

impl Schema for FieldsSchema {
    fn marshal(&self, value: &Value) -> Result<Value> {
        let object = value.as_object().ok_or_else(|| BlackboardError::Serialization {
            message: format!("field projection expects an object, got {}", kind_name(value)),
        })?;
        let mut projected = serde_json::Map::new();
        for field in &self.fields {
            match object.get(field) {
                Some(v) => {
                    projected.insert(field.clone(), v.clone());
                }
                None => {
                    return Err(BlackboardError::Serialization {
                        message: format!("missing field '{}' in value", field),
                    })
                }
            }
        }
        Ok(Value::Object(projected))
    }

    fn unmarshal(&self, raw: &Value) -> Result<Value> {
        Ok(raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Contact {
        name: String,
        email: String,
    }

    #[test]
    fn test_mode_selection() {
        let schema: Arc<dyn Schema> = TypedSchema::<Contact>::new();
        assert!(matches!(
            MarshalMode::select(None, &json!({"a": 1})),
            MarshalMode::None
        ));
        assert!(matches!(
            MarshalMode::select(Some(schema.clone()), &json!({"a": 1})),
            MarshalMode::Scalar(_)
        ));
        assert!(matches!(
            MarshalMode::select(Some(schema), &json!([1, 2])),
            MarshalMode::Sequence(_)
        ));
    }

    #[test]
    fn test_typed_schema_round_trip() {
        let schema = TypedSchema::<Contact>::new();
        let value = json!({"name": "G.Ted", "email": "gted221@example.com"});
        let marshalled = schema.marshal(&value).unwrap();
        let restored = schema.unmarshal(&marshalled).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_typed_schema_rejects_wrong_shape() {
        let schema = TypedSchema::<Contact>::new();
        let err = schema.marshal(&json!({"name": "G.Ted"})).unwrap_err();
        assert!(matches!(err, BlackboardError::Serialization { .. }));
    }

    #[test]
    fn test_sequence_mode_marshals_element_wise() {
        let schema: Arc<dyn Schema> = TypedSchema::<Contact>::new();
        let value = json!([
            {"name": "A", "email": "a@example.com"},
            {"name": "B", "email": "b@example.com"},
        ]);
        let mode = MarshalMode::select(Some(schema), &value);
        let marshalled = mode.marshal(&value).unwrap();
        assert_eq!(marshalled.as_array().unwrap().len(), 2);
        assert_eq!(mode.unmarshal(&marshalled).unwrap(), value);
    }

    #[test]
    fn test_sequence_mode_rejects_non_array() {
        let schema: Arc<dyn Schema> = TypedSchema::<Contact>::new();
        let mode = MarshalMode::Sequence(schema);
        let err = mode
            .marshal(&json!({"name": "A", "email": "a@example.com"}))
            .unwrap_err();
        assert!(matches!(err, BlackboardError::Serialization { .. }));
    }

    #[test]
    fn test_fields_schema_projects() {
        let schema = FieldsSchema::new(["name", "email"]);
        let value = json!({
            "name": "G.Ted",
            "email": "gted221@example.com",
            "password": "hunter2",
        });
        let projected = schema.marshal(&value).unwrap();
        assert_eq!(
            projected,
            json!({"name": "G.Ted", "email": "gted221@example.com"})
        );
        assert!(projected.get("password").is_none());
    }

    #[test]
    fn test_fields_schema_missing_field() {
        let schema = FieldsSchema::new(["name", "email"]);
        let err = schema.marshal(&json!({"name": "G.Ted"})).unwrap_err();
        assert!(matches!(err, BlackboardError::Serialization { .. }));
    }
}
