//! Path flattening
//!
//! Turns a nested JSON document into a flat `dotted.key → scalar` map so that
//! mapping sources can be plain key lookups instead of a path-query language.
//! Literal dots and backslashes inside keys are escaped (`\.` and `\\`), so
//! the original segments stay recoverable with [`split_flat_key`].

use indexmap::IndexMap;
use serde_json::Value;

/// Flat view of a document: escaped dotted path → scalar leaf
pub type FlatMap = IndexMap<String, Value>;

/// Flatten a nested document.
///
/// An object whose values are all scalars is returned as is (keys are not
/// escaped in that case).
pub fn flatten(node: &Value) -> FlatMap {
    let mut flat = FlatMap::new();
    match node {
        Value::Object(map) if map.is_empty() => {}
        Value::Object(map) if map.values().all(is_scalar) => {
            flat.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Value::Object(_) | Value::Array(_) => flatten_into(node, "", &mut flat),
        _ => {}
    }
    flat
}

fn flatten_into(node: &Value, path: &str, flat: &mut FlatMap) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                let child = format!("{}.{}", path, escape_key(key));
                flatten_into(value, &child, flat);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let child = format!("{}.{}", path, index);
                flatten_into(value, &child, flat);
            }
        }
        leaf => {
            flat.insert(path.trim_start_matches('.').to_string(), leaf.clone());
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

/// Escape one key segment for use in a flat path.
pub fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('.', "\\.")
}

/// Split an escaped flat path back into its original key segments.
pub fn split_flat_key(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Navigate a nested document with an escaped flat path.
pub fn get_path<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(node);
    }
    let mut current = node;
    for segment in split_flat_key(path) {
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            other => other.get(&segment)?,
        };
    }
    Some(current)
}

/// Render a scalar leaf as text.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let flat = flatten(&json!({"a": {"b": 1, "c": {"d": 2}}}));
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["a.b"], json!(1));
        assert_eq!(flat["a.c.d"], json!(2));
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&json!({})).is_empty());
        assert!(flatten(&Value::Null).is_empty());
        assert!(flatten(&json!([])).is_empty());
    }

    #[test]
    fn test_flat_input_is_unchanged() {
        let flat = flatten(&json!({"name": "Paris", "a.b": 3}));
        assert_eq!(flat["name"], json!("Paris"));
        assert_eq!(flat["a.b"], json!(3));
    }

    #[test]
    fn test_escaped_keys_are_recoverable() {
        let flat = flatten(&json!({"dc.title": {"x\\y": "v"}, "list": ["a", {"k": "b"}]}));
        let keys: Vec<&String> = flat.keys().collect();
        assert_eq!(keys, vec!["dc\\.title.x\\\\y", "list.0", "list.1.k"]);
        assert_eq!(split_flat_key("dc\\.title.x\\\\y"), vec!["dc.title", "x\\y"]);
        assert_eq!(split_flat_key("list.1.k"), vec!["list", "1", "k"]);
    }

    #[test]
    fn test_get_path() {
        let doc = json!({"response": {"docs": [{"id": 1}, {"id": 2}]}, "a.b": {"c": true}});
        assert_eq!(get_path(&doc, "response.docs.1.id"), Some(&json!(2)));
        assert_eq!(get_path(&doc, "a\\.b.c"), Some(&json!(true)));
        assert_eq!(get_path(&doc, "response.missing"), None);
        assert_eq!(get_path(&doc, ""), Some(&doc));
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("x")), "x");
        assert_eq!(scalar_to_string(&json!(12)), "12");
        assert_eq!(scalar_to_string(&json!(1.5)), "1.5");
        assert_eq!(scalar_to_string(&json!(null)), "");
        assert_eq!(scalar_to_string(&json!(false)), "false");
    }
}
