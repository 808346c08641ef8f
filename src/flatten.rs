//! Document flattening
//!
//! Collections store flat columns, so nested documents are flattened before
//! they are written: `{"user": {"country": "US"}}` becomes
//! `{"user.country": "US"}`. Array items are addressed by index
//! (`tags.0`, `tags.1`). Empty objects and arrays produce no columns.
//!
//! The merger reads these columns back as `user_country`, see
//! [`normalize_column`](crate::query::normalize_column).

use serde_json::{Map, Value};

/// Separator between nested keys
pub const KEY_SEPARATOR: &str = ".";

/// Flatten a document into a single-level map
pub fn flatten(document: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    // A scalar document has no column name to hang off
    if document.is_object() || document.is_array() {
        flatten_into(&mut out, None, document);
    }
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = join(prefix, key);
                flatten_into(out, Some(&path), child);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let path = join(prefix, &i.to_string());
                flatten_into(out, Some(&path), child);
            }
        }
        scalar => {
            if let Some(path) = prefix {
                out.insert(path.to_string(), scalar.clone());
            }
        }
    }
}

fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) => format!("{}{}{}", p, KEY_SEPARATOR, key),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_document_unchanged() {
        let doc = json!({"country": "US", "visits": 3});
        assert_eq!(Value::Object(flatten(&doc)), doc);
    }

    #[test]
    fn test_nested_objects() {
        let flat = flatten(&json!({
            "user": {"country": "US", "device": {"os": "linux"}},
            "visits": 1
        }));

        assert_eq!(flat["user.country"], json!("US"));
        assert_eq!(flat["user.device.os"], json!("linux"));
        assert_eq!(flat["visits"], json!(1));
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn test_arrays_indexed() {
        let flat = flatten(&json!({"tags": ["a", "b"], "pairs": [{"k": 1}]}));

        assert_eq!(flat["tags.0"], json!("a"));
        assert_eq!(flat["tags.1"], json!("b"));
        assert_eq!(flat["pairs.0.k"], json!(1));
    }

    #[test]
    fn test_empty_containers_dropped() {
        let flat = flatten(&json!({"empty": {}, "none": [], "x": null}));

        assert_eq!(flat.len(), 1);
        assert_eq!(flat["x"], Value::Null);
    }

    #[test]
    fn test_scalar_document() {
        assert!(flatten(&json!(42)).is_empty());
    }
}
