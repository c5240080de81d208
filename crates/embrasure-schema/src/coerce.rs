//! Value coercion against a [`Schema`].

use serde_json::{Map, Number, Value};

use crate::error::{CoercionError, Violation};
use crate::keys::normalize_key;
use crate::schema::{ObjectShape, Schema, Shape};

impl Schema {
    /// Coerce `data` to this schema.
    ///
    /// Object keys are accepted in normalized or wire form and emitted in wire
    /// form; undeclared keys are dropped unless the object is open; missing
    /// values take their declared default. Scalar strings are converted to the
    /// declared type. The result is then validated. Every missing required key
    /// is reported at once.
    pub fn coerce(&self, data: &Value) -> Result<Value, CoercionError> {
        let mut missing = Vec::new();
        let coerced = conform(self.shape(), data, "", &mut missing);

        if !missing.is_empty() {
            return Err(CoercionError::MissingKeys { keys: missing });
        }

        let violations: Vec<Violation> = self
            .validator()
            .iter_errors(&coerced)
            .map(|e| Violation {
                field: pointer_to_path(&e.instance_path.to_string()),
                reason: e.to_string(),
            })
            .collect();

        if !violations.is_empty() {
            tracing::debug!(count = violations.len(), "coerced value failed validation");
            return Err(CoercionError::Invalid { violations });
        }

        Ok(coerced)
    }
}

fn conform(shape: &Shape, value: &Value, path: &str, missing: &mut Vec<String>) -> Value {
    match (shape, value) {
        (Shape::Object(object), Value::Object(map)) => conform_object(object, map, path, missing),
        (Shape::Array(items), Value::Array(values)) => Value::Array(
            values
                .iter()
                .map(|v| conform(items, v, path, missing))
                .collect(),
        ),
        // A lone scalar for an array parameter is a one-element array.
        (Shape::Array(items), Value::String(_) | Value::Number(_) | Value::Bool(_)) => {
            Value::Array(vec![conform(items, value, path, missing)])
        }
        (Shape::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        // Whole floats become integers only when i64 holds them exactly;
        // anything wider is left for validation to judge.
        (Shape::Integer, Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && fits_i64(f) => Value::from(f as i64),
            _ => value.clone(),
        },
        (Shape::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        (Shape::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value.clone(),
        },
        (Shape::String, Value::Number(n)) => Value::String(n.to_string()),
        (Shape::String, Value::Bool(b)) => Value::String(b.to_string()),
        _ => value.clone(),
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn fits_i64(f: f64) -> bool {
    f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn conform_object(
    object: &ObjectShape,
    map: &Map<String, Value>,
    path: &str,
    missing: &mut Vec<String>,
) -> Value {
    let mut out = Map::with_capacity(object.fields.len());

    for field in &object.fields {
        let field_path = join(path, &field.wire);
        let supplied = map
            .get(&field.key)
            .or_else(|| map.get(&field.wire))
            .or_else(|| {
                map.iter()
                    .find(|(k, _)| normalize_key(k) == field.key)
                    .map(|(_, v)| v)
            })
            .filter(|v| !v.is_null());

        match supplied {
            Some(v) => {
                out.insert(
                    field.wire.clone(),
                    conform(&field.shape, v, &field_path, missing),
                );
            }
            None => {
                if let Some(default) = &field.default {
                    out.insert(field.wire.clone(), default.clone());
                } else if field.required {
                    missing.push(field_path);
                }
            }
        }
    }

    if object.open {
        for (key, value) in map {
            if object.field(key).is_none() && !out.contains_key(key) {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    Value::Object(out)
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// `/owner/name` → `owner.name`.
fn pointer_to_path(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}
