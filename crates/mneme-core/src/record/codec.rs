use super::Record;
use crate::error::{Error, Result};
use serde::ser::Error as _;
use serde_json::{Map, Value};

/// Raw, backend-facing form of a record
pub type RawRecord = Map<String, Value>;

/// Encode typed records into raw maps
///
/// # Errors
///
/// Returns [`Error::Serialization`] if a record fails to serialize or does not
/// serialize to a JSON object.
pub fn encode<T: Record>(items: &[T]) -> Result<Vec<RawRecord>> {
    items
        .iter()
        .map(|item| match serde_json::to_value(item)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Serialization(serde_json::Error::custom(format!(
                "record must serialize to an object, got {}",
                kind_of(&other)
            )))),
        })
        .collect()
}

/// Decode raw maps into typed records
///
/// # Errors
///
/// Returns [`Error::Serialization`] on the first raw record that does not match `T`.
pub fn decode<T: Record>(raw: Vec<RawRecord>) -> Result<Vec<T>> {
    raw.into_iter()
        .map(|map| serde_json::from_value(Value::Object(map)).map_err(Error::from))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
