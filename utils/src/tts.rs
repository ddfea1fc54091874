//! Helpers for caching files produced by a text-to-speech engine.

use md5::{Digest, Md5};
use serde_json::{Map, Value};

pub const DEFAULT_FORMAT: &str = "wav";

/// Option holding the list of (flattened) option keys that take part in the cache key.
pub const CACHING_FIELDS: &str = "cachingFields";

/// Computes the cache filename for `text` synthesized with `options`.
///
/// When `options` carries `cachingFields`, the values of those fields (looked up
/// in the dot-flattened options) are sorted and joined into the hashed input.
/// Otherwise the text itself is used. Identical inputs always yield the same name.
pub fn compute_filename(text: &str, options: &Value, format: &str) -> String {
    let mut c = text.to_string();
    if let Some(fields) = options.get(CACHING_FIELDS).and_then(Value::as_array) {
        let flat = flatten(options);
        let mut values: Vec<Option<String>> = fields
            .iter()
            .map(|field| {
                field
                    .as_str()
                    .and_then(|key| flat.get(key))
                    .map(js_string)
            })
            .collect();
        // missing fields sort last
        values.sort_by(|a, b| match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        c = values
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>()
            .join(",");
    }
    let digest = Md5::digest(format!("{},{}", text, c).as_bytes());
    format!("{}.{}", hex::encode(digest), format)
}

/// Renders a one level options object as `key=value&key=value`.
pub fn options_to_query_string(obj: &Map<String, Value>) -> String {
    obj.iter()
        .map(|(key, value)| format!("{}={}", key, js_string(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Flattens nested objects and arrays into dot separated keys (`a.b`, `list.0`).
fn flatten(value: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(None, value, &mut flat);
    flat
}

fn flatten_into(prefix: Option<&str>, value: &Value, flat: &mut Map<String, Value>) {
    let join = |key: &str| match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(Some(&join(key)), child, flat);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(Some(&join(&index.to_string())), child, flat);
            }
        }
        leaf => {
            if let Some(prefix) = prefix {
                flat.insert(prefix.to_string(), leaf.clone());
            }
        }
    }
}

/// String form of a value as the engine's option serializer renders it:
/// bare strings, integral numbers without a fraction, null as empty.
fn js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_f64() {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
                        format!("{:.0}", f)
                    }
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            } else {
                n.to_string()
            }
        }
        Value::Array(items) => items.iter().map(js_string).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
