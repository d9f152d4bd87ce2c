//! Lenient field decoders.
//!
//! The API is inconsistent about scalar types: ids are integers on most
//! resources and UUID strings on tasks, and counters may read `"N/A"` before
//! a job is planned.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

fn value_to_id(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Decode an id given either as a number or a string
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected a numeric or string id"))
}

/// Decode an optional id given either as a number or a string
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_id))
}

/// Decode a counter; anything that is not a non-negative integer becomes `None`
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Encode an id as a JSON number when it is numeric, as a string otherwise
pub fn ser_id<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id.parse::<u64>() {
        Ok(n) => serializer.serialize_u64(n),
        Err(_) => serializer.serialize_str(id),
    }
}
