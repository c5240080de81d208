//! `$ref` inlining and dialect clean-up for JSON Schema fragments.

use std::collections::HashSet;

use serde_json::{Map, Value};

use embrasure_spec_parser::resolve_ref;

use crate::error::SchemaError;

/// Recursively resolve all `$ref` pointers in a JSON Schema value.
///
/// Inlines the referenced definition in place. `visited` tracks the current
/// resolution chain; a reference back into that chain (a recursive
/// definition) is replaced by the open schema `{}`.
pub fn resolve_refs(
    value: &Value,
    root: &Value,
    visited: &mut HashSet<String>,
) -> Result<Value, SchemaError> {
    match value {
        Value::Object(obj) => {
            if let Some(ref_str) = obj.get("$ref").and_then(|v| v.as_str()) {
                if !visited.insert(ref_str.to_string()) {
                    tracing::debug!(reference = ref_str, "recursive $ref left open");
                    return Ok(Value::Object(Map::new()));
                }
                let target = resolve_ref(root, ref_str)
                    .ok_or_else(|| SchemaError::UnresolvedRef(ref_str.to_string()))?;
                let resolved = resolve_refs(target, root, visited)?;
                visited.remove(ref_str);
                Ok(resolved)
            } else {
                let mut new_obj = Map::with_capacity(obj.len());
                for (key, val) in obj {
                    new_obj.insert(key.clone(), resolve_refs(val, root, visited)?);
                }
                Ok(Value::Object(new_obj))
            }
        }
        Value::Array(arr) => {
            let items: Result<Vec<_>, _> = arr
                .iter()
                .map(|v| resolve_refs(v, root, visited))
                .collect();
            Ok(Value::Array(items?))
        }
        other => Ok(other.clone()),
    }
}

/// Rewrite Swagger/OpenAPI 3.0 dialect into plain JSON Schema.
///
/// `nullable: true` widens `type` with `"null"`; Swagger's `type: file` has no
/// JSON Schema equivalent and is dropped.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Object(obj) => {
            let nullable = obj.get("nullable") == Some(&Value::Bool(true));
            let mut out = Map::with_capacity(obj.len());
            for (key, val) in obj {
                if key == "nullable" && val.is_boolean() {
                    continue;
                }
                if key == "type" {
                    if let Value::String(t) = &val {
                        if t == "file" {
                            continue;
                        }
                        if nullable {
                            let widened = Value::Array(vec![Value::String(t.clone()), "null".into()]);
                            out.insert(key, widened);
                            continue;
                        }
                    }
                }
                out.insert(key, sanitize(val));
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(sanitize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inlines_nested_refs() {
        let root = json!({
            "definitions": {
                "Owner": {"type": "object", "properties": {"name": {"type": "string"}}},
                "Pet": {"type": "object", "properties": {"owner": {"$ref": "#/definitions/Owner"}}}
            }
        });
        let resolved =
            resolve_refs(&json!({"$ref": "#/definitions/Pet"}), &root, &mut HashSet::new())
                .unwrap();
        assert_eq!(
            resolved["properties"]["owner"]["properties"]["name"]["type"],
            "string"
        );
    }

    #[test]
    fn same_ref_twice_is_inlined_twice() {
        let root = json!({"definitions": {"Id": {"type": "integer"}}});
        let schema = json!({
            "type": "object",
            "properties": {
                "a": {"$ref": "#/definitions/Id"},
                "b": {"$ref": "#/definitions/Id"}
            }
        });
        let resolved = resolve_refs(&schema, &root, &mut HashSet::new()).unwrap();
        assert_eq!(resolved["properties"]["a"], json!({"type": "integer"}));
        assert_eq!(resolved["properties"]["b"], json!({"type": "integer"}));
    }

    #[test]
    fn follows_escaped_pointer_segments() {
        let root = json!({"components": {"schemas": {"a/b": {"type": "string"}, "c~d": {"type": "boolean"}}}});
        let schema = json!({
            "type": "object",
            "properties": {
                "slash": {"$ref": "#/components/schemas/a~1b"},
                "tilde": {"$ref": "#/components/schemas/c~0d"}
            }
        });
        let resolved = resolve_refs(&schema, &root, &mut HashSet::new()).unwrap();
        assert_eq!(resolved["properties"]["slash"]["type"], "string");
        assert_eq!(resolved["properties"]["tilde"]["type"], "boolean");
    }

    #[test]
    fn recursive_refs_are_left_open() {
        let root = json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/Node"}}
                    }
                }
            }
        });
        let resolved =
            resolve_refs(&json!({"$ref": "#/definitions/Node"}), &root, &mut HashSet::new())
                .unwrap();
        assert_eq!(resolved["properties"]["name"]["type"], "string");
        assert_eq!(resolved["properties"]["children"]["items"], json!({}));
    }

    #[test]
    fn reports_unresolved_refs() {
        let result = resolve_refs(
            &json!({"$ref": "#/components/schemas/Missing"}),
            &json!({}),
            &mut HashSet::new(),
        );
        assert!(matches!(result, Err(SchemaError::UnresolvedRef(_))));
    }

    #[test]
    fn sanitize_nullable_and_file() {
        let out = sanitize(json!({
            "type": "object",
            "properties": {
                "nickname": {"type": "string", "nullable": true},
                "upload": {"type": "file"}
            }
        }));
        assert_eq!(out["properties"]["nickname"]["type"], json!(["string", "null"]));
        assert!(out["properties"]["nickname"].get("nullable").is_none());
        assert!(out["properties"]["upload"].get("type").is_none());
    }
}
