//! JSON text form of records.
//!
//! Daemon responses arrive as JSON and canonical records leave as JSON, so
//! this is the only text codec the workspace needs. Parsing goes through
//! `serde_json` and is then narrowed to [`Value`]: floats are rejected and
//! object keys come out sorted.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Decode a record from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not valid JSON or contains floats.
pub fn from_json(text: &str) -> CodecResult<Value> {
    let parsed: serde_json::Value = serde_json::from_str(text)?;
    Value::try_from(parsed)
}

/// Decode a record from JSON bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 JSON or contain floats.
pub fn from_json_slice(bytes: &[u8]) -> CodecResult<Value> {
    let parsed: serde_json::Value = serde_json::from_slice(bytes)?;
    Value::try_from(parsed)
}

/// Encode a record as compact JSON text.
///
/// # Errors
///
/// Returns an error if an integer is outside both the `i64` and `u64` ranges.
pub fn to_json(value: &Value) -> CodecResult<String> {
    let json = serde_json::Value::try_from(value)?;
    serde_json::to_string(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encode a record as indented JSON text.
///
/// # Errors
///
/// Returns an error if an integer is outside both the `i64` and `u64` ranges.
pub fn to_json_pretty(value: &Value) -> CodecResult<String> {
    let json = serde_json::Value::try_from(value)?;
    serde_json::to_string_pretty(&json).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

impl TryFrom<serde_json::Value> for Value {
    type Error = CodecError;

    fn try_from(json: serde_json::Value) -> CodecResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Integer(i128::from(u))
                } else {
                    return Err(CodecError::FloatForbidden);
                }
            }
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<CodecResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(object) => {
                let mut pairs = Vec::with_capacity(object.len());
                for (key, value) in object {
                    pairs.push((key, Value::try_from(value)?));
                }
                Value::map(pairs)
            }
        })
    }
}

impl TryFrom<&Value> for serde_json::Value {
    type Error = CodecError;

    fn try_from(value: &Value) -> CodecResult<Self> {
        Ok(match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => {
                let number = if let Ok(i) = i64::try_from(*n) {
                    serde_json::Number::from(i)
                } else if let Ok(u) = u64::try_from(*n) {
                    serde_json::Number::from(u)
                } else {
                    return Err(CodecError::IntegerOverflow {
                        value: n.to_string(),
                    });
                };
                serde_json::Value::Number(number)
            }
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(serde_json::Value::try_from)
                    .collect::<CodecResult<Vec<_>>>()?,
            ),
            Value::Map(pairs) => {
                let mut object = serde_json::Map::with_capacity(pairs.len());
                for (key, value) in pairs {
                    object.insert(key.clone(), serde_json::Value::try_from(value)?);
                }
                serde_json::Value::Object(object)
            }
        })
    }
}
