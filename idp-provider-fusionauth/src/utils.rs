//! Utility functions for value conversion

use std::collections::HashMap;

use idp_core::provider::{ProviderError, ProviderResult};
use idp_core::resource::Value;

/// Convert a JSON value to an attribute Value
///
/// `null` has no attribute representation and yields `None`; null entries
/// inside arrays and objects are dropped. Numbers must be 64-bit integers.
pub fn json_to_value(value: &serde_json::Value) -> ProviderResult<Option<Value>> {
    let value = match value {
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => {
                return Err(ProviderError::validation(format!(
                    "Unsupported number {}: expected a 64-bit integer",
                    n
                )));
            }
        },
        serde_json::Value::Array(arr) => {
            let mut items = Vec::with_capacity(arr.len());
            for item in arr {
                if let Some(item) = json_to_value(item)? {
                    items.push(item);
                }
            }
            Value::List(items)
        }
        serde_json::Value::Object(obj) => Value::Map(json_object_to_attributes(obj)?),
        serde_json::Value::Null => return Ok(None),
    };
    Ok(Some(value))
}

/// Convert a JSON object to an attribute map
pub fn json_object_to_attributes(
    obj: &serde_json::Map<String, serde_json::Value>,
) -> ProviderResult<HashMap<String, Value>> {
    let mut attributes = HashMap::new();
    for (key, value) in obj {
        let converted = json_to_value(value).map_err(|e| {
            ProviderError::validation(format!("{}: {}", key, e.message))
        })?;
        if let Some(converted) = converted {
            attributes.insert(key.clone(), converted);
        }
    }
    Ok(attributes)
}

/// Convert an attribute Value to JSON
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(attributes_to_json_object(map)),
    }
}

/// Convert an attribute map to a JSON object with sorted keys
pub fn attributes_to_json_object(
    attributes: &HashMap<String, Value>,
) -> serde_json::Map<String, serde_json::Value> {
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|k| (k.clone(), value_to_json(&attributes[k])))
        .collect()
}
