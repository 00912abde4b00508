//! Dotted-path access into JSON documents and JSON-schema traversal.
//!
//! Form definitions annotate schema leaves with `readFrom` / `writeTo`
//! keys; the engine walks schemas and copies values between submitted
//! form data and the workflow-level context using these helpers.

use serde_json::{Map, Value};

/// Read the value at a dotted path (`"a.b.c"`) in a JSON object tree.
pub fn get_value_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write a value at a dotted path, creating intermediate objects as needed.
/// A non-object intermediate is replaced by an object.
pub fn set_value_by_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    let segments: Vec<&str> = path.split('.').collect();
    for (i, segment) in segments.iter().enumerate() {
        let map = coerce_object(current);
        if i == segments.len() - 1 {
            map.insert((*segment).to_string(), value);
            return;
        }
        current = map
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

fn coerce_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("coerced to object above"),
    }
}

/// Walk a JSON schema, invoking `visit(path, node, parent)` for every leaf
/// reachable through `properties` / `items`. A leaf is a schema node with
/// neither `properties` nor `items`. Array descent does not extend the path.
pub fn traverse_schema<F>(schema: &Value, visit: &mut F)
where
    F: FnMut(&str, &Value, Option<&Value>),
{
    traverse_inner(schema, None, String::new(), visit);
}

fn traverse_inner<F>(node: &Value, parent: Option<&Value>, path: String, visit: &mut F)
where
    F: FnMut(&str, &Value, Option<&Value>),
{
    let properties = node.get("properties").and_then(Value::as_object);
    let items = node.get("items");

    match (properties, items) {
        (Some(props), _) => {
            for (key, child) in props {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                traverse_inner(child, Some(node), child_path, visit);
            }
        }
        (None, Some(item_schema)) => {
            traverse_inner(item_schema, Some(node), path, visit);
        }
        (None, None) => visit(&path, node, parent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_value_by_path() {
        let doc = json!({"a": {"b": {"c": "deep"}}, "top": 1});
        assert_eq!(get_value_by_path(&doc, "a.b.c"), Some(&json!("deep")));
        assert_eq!(get_value_by_path(&doc, "top"), Some(&json!(1)));
        assert_eq!(get_value_by_path(&doc, "a.missing"), None);
        assert_eq!(get_value_by_path(&doc, "top.c"), None);
    }

    #[test]
    fn test_set_value_by_path_creates_intermediates() {
        let mut doc = json!({});
        set_value_by_path(&mut doc, "a.b.c", json!("v"));
        assert_eq!(doc, json!({"a": {"b": {"c": "v"}}}));

        set_value_by_path(&mut doc, "a.b.d", json!(2));
        assert_eq!(get_value_by_path(&doc, "a.b.c"), Some(&json!("v")));
        assert_eq!(get_value_by_path(&doc, "a.b.d"), Some(&json!(2)));
    }

    #[test]
    fn test_set_value_by_path_replaces_scalar_intermediate() {
        let mut doc = json!({"a": 1});
        set_value_by_path(&mut doc, "a.b", json!("v"));
        assert_eq!(doc, json!({"a": {"b": "v"}}));
    }

    #[test]
    fn test_traverse_visits_leaves_with_dotted_paths() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "writeTo": "trader:name"},
                "address": {
                    "type": "object",
                    "properties": {
                        "city": {"type": "string"}
                    }
                },
                "lines": {
                    "type": "array",
                    "items": {"type": "string"}
                }
            }
        });

        let mut seen = Vec::new();
        traverse_schema(&schema, &mut |path, node, _parent| {
            seen.push((path.to_string(), node.get("writeTo").cloned()));
        });
        seen.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "address.city");
        assert_eq!(seen[1].0, "lines");
        assert_eq!(seen[2], ("name".to_string(), Some(json!("trader:name"))));
    }
}
