//! Dotted-path access over nested JSON mappings.
//!
//! Paths are `.`-delimited key sequences. Segments are always mapping keys:
//! `items.0` addresses the key `"0"` of the `items` object, never an array
//! index. A read that runs into a missing key or a non-object value yields
//! `None` (undefined), which is distinct from `Some(Value::Null)`.

use serde_json::{Map, Value};

/// Read the value at `path` under `root`.
///
/// An empty path returns `root` itself.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.')
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            _ => None,
        })
}

/// Write `value` at `path` under `root`.
///
/// Missing intermediate mappings are created; an intermediate that holds a
/// non-object value is replaced by a fresh mapping. The final segment is
/// overwritten unconditionally. An empty path replaces `root`.
pub fn set(root: &mut Value, path: &str, value: Value) {
    if path.is_empty() {
        *root = value;
        return;
    }
    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };
    let mut current = root;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            current = ensure_object(current)
                .entry(segment.to_owned())
                .or_insert(Value::Null);
        }
    }
    ensure_object(current).insert(last.to_owned(), value);
}

/// Whether `path` resolves to a defined value.
pub fn contains(root: &Value, path: &str) -> bool {
    get(root, path).is_some()
}

/// Shallow-merge `source` into the object at `target`, key by key.
///
/// A non-object `target` is replaced by an empty mapping first.
pub fn merge(target: &mut Value, source: Map<String, Value>) {
    let map = ensure_object(target);
    for (key, value) in source {
        map.insert(key, value);
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // ── get ──────────────────────────────────────────────────────────

    #[test]
    fn get_top_level_and_nested() {
        let root = json!({"a": 1, "b": {"c": {"d": "deep"}}});
        assert_eq!(get(&root, "a"), Some(&json!(1)));
        assert_eq!(get(&root, "b.c.d"), Some(&json!("deep")));
    }

    #[test]
    fn get_empty_path_returns_root() {
        let root = json!({"a": 1});
        assert_eq!(get(&root, ""), Some(&root));
    }

    #[test]
    fn get_missing_is_undefined() {
        let root = json!({"a": {"b": 1}});
        assert_eq!(get(&root, "x"), None);
        assert_eq!(get(&root, "a.x"), None);
    }

    #[test]
    fn get_through_scalar_is_undefined() {
        let root = json!({"a": "text"});
        assert_eq!(get(&root, "a.length"), None);
    }

    #[test]
    fn get_null_is_defined() {
        let root = json!({"a": null});
        assert_eq!(get(&root, "a"), Some(&Value::Null));
        assert!(contains(&root, "a"));
    }

    #[test]
    fn numeric_segments_are_keys() {
        let root = json!({"items": ["zero", "one"], "map": {"0": "key"}});
        assert_eq!(get(&root, "items.0"), None);
        assert_eq!(get(&root, "map.0"), Some(&json!("key")));
    }

    // ── set ──────────────────────────────────────────────────────────

    #[test]
    fn set_materializes_intermediates() {
        let mut root = json!({});
        set(&mut root, "user.address.city", json!("Oslo"));
        assert_eq!(root, json!({"user": {"address": {"city": "Oslo"}}}));
    }

    #[test]
    fn set_overwrites_scalar_intermediate() {
        let mut root = json!({"user": "anonymous"});
        set(&mut root, "user.name", json!("Ann"));
        assert_eq!(root, json!({"user": {"name": "Ann"}}));
    }

    #[test]
    fn set_overwrites_final_segment() {
        let mut root = json!({"a": {"b": 1, "c": 2}});
        set(&mut root, "a.b", json!({"replaced": true}));
        assert_eq!(root, json!({"a": {"b": {"replaced": true}, "c": 2}}));
    }

    #[test]
    fn set_on_non_object_root() {
        let mut root = json!(42);
        set(&mut root, "a", json!(1));
        assert_eq!(root, json!({"a": 1}));
    }

    #[test]
    fn set_empty_path_replaces_root() {
        let mut root = json!({"a": 1});
        set(&mut root, "", json!({"b": 2}));
        assert_eq!(root, json!({"b": 2}));
    }

    #[test]
    fn round_trip() {
        let paths = ["a", "a.b", "x.y.z", "items.0", "weird-key.with_underscore"];
        let values = [json!(null), json!(0), json!("s"), json!([1, 2]), json!({"k": "v"})];
        for path in paths {
            for value in &values {
                let mut root = json!({"a": 5, "items": [1]});
                set(&mut root, path, value.clone());
                assert_eq!(get(&root, path), Some(value), "path {path}");
            }
        }
    }

    // ── merge ────────────────────────────────────────────────────────

    #[test]
    fn merge_is_shallow() {
        let mut root = json!({"a": {"x": 1}, "b": 2});
        let source = json!({"a": {"y": 2}, "c": 3});
        merge(&mut root, source.as_object().unwrap().clone());
        assert_eq!(root, json!({"a": {"y": 2}, "b": 2, "c": 3}));
    }
}
