//! Response envelope handling for the tool-execution platform
//!
//! Tool results may arrive wrapped as `{data: ...}` or `{response_data: ...}`,
//! possibly more than once, or as a JSON document encoded in a string. This is
//! the only place those shapes are untangled.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::SourceError;

const MAX_UNWRAP_DEPTH: usize = 4;

const WRAPPER_KEYS: [&str; 2] = ["data", "response_data"];

/// Strip envelopes and decode string payloads
///
/// Malformed JSON strings and `null` become an empty object.
pub fn unwrap_payload(value: Value) -> Value {
    let mut current = value;

    for _ in 0..MAX_UNWRAP_DEPTH {
        current = match current {
            Value::Null => return empty_object(),
            Value::String(text) => match serde_json::from_str::<Value>(&text) {
                Ok(parsed) => parsed,
                Err(_) => return empty_object(),
            },
            Value::Object(mut obj) => match take_wrapped(&mut obj) {
                Some(inner) => inner,
                None => return Value::Object(obj),
            },
            other => return other,
        };
    }

    match current {
        Value::Null | Value::String(_) => empty_object(),
        other => other,
    }
}

/// Unwrap and decode into a typed payload
pub fn decode_payload<T: DeserializeOwned>(action: &str, value: Value) -> Result<T, SourceError> {
    serde_json::from_value(unwrap_payload(value))
        .map_err(|e| SourceError::Parse(format!("{}: {}", action, e)))
}

fn take_wrapped(obj: &mut Map<String, Value>) -> Option<Value> {
    for key in WRAPPER_KEYS {
        let wraps_document = matches!(
            obj.get(key),
            Some(Value::Object(_)) | Some(Value::Array(_)) | Some(Value::String(_))
        );
        if wraps_document {
            return obj.remove(key);
        }
    }
    None
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
