use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::keys::normalize_key;
use crate::refs::{resolve_refs, sanitize};

/// Options applied when a schema is constructed.
#[derive(Debug, Clone, Copy)]
pub struct SchemaOptions {
    /// Fill missing values from the schema's `default` (default: true).
    pub use_defaults: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self { use_defaults: true }
    }
}

/// One declared parameter, as fed to [`Schema::object`].
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// The wire name.
    pub name: String,
    pub required: bool,
    /// JSON Schema for the value; may contain `$ref`.
    pub schema: Value,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, required: bool, schema: Value) -> Self {
        Self {
            name: name.into(),
            required,
            schema,
        }
    }
}

/// A compiled schema: the resolved JSON Schema, its coercion shape, and a
/// `jsonschema` validator. Cheap to clone.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<Inner>,
}

struct Inner {
    raw: Value,
    pub(crate) shape: Shape,
    validator: jsonschema::Validator,
}

/// What coercion needs to know about a schema.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Any,
    Boolean,
    Integer,
    Number,
    String,
    Array(Box<Shape>),
    Object(ObjectShape),
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectShape {
    pub(crate) fields: Vec<Field>,
    /// Undeclared keys are passed through instead of dropped.
    pub(crate) open: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Field {
    /// Normalized name.
    pub(crate) key: String,
    /// Name as declared.
    pub(crate) wire: String,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) shape: Shape,
}

impl Schema {
    /// Build a schema from a JSON Schema fragment.
    ///
    /// `definitions` is the document subtree that `$ref` pointers resolve
    /// against; pass `Value::Null` for self-contained schemas.
    pub fn from_json(
        raw: &Value,
        definitions: &Value,
        options: SchemaOptions,
    ) -> Result<Self, SchemaError> {
        let resolved = resolve_refs(raw, definitions, &mut HashSet::new())?;
        Self::compile(sanitize(resolved), options)
    }

    /// Build an object schema with one property per declared parameter.
    pub fn object(
        fields: &[FieldDecl],
        definitions: &Value,
        options: SchemaOptions,
    ) -> Result<Self, SchemaError> {
        let properties: Map<String, Value> = fields
            .iter()
            .map(|f| (f.name.clone(), f.schema.clone()))
            .collect();
        let required: Vec<&str> = fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut raw = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            raw["required"] = json!(required);
        }
        Self::from_json(&raw, definitions, options)
    }

    fn compile(raw: Value, options: SchemaOptions) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&raw)
            .map_err(|e| SchemaError::Invalid(e.to_string()))?;
        let shape = Shape::derive(&raw, options);

        Ok(Self {
            inner: Arc::new(Inner {
                raw,
                shape,
                validator,
            }),
        })
    }

    /// The resolved JSON Schema.
    pub fn raw(&self) -> &Value {
        &self.inner.raw
    }

    /// Normalized names of the top-level properties, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        match &self.inner.shape {
            Shape::Object(object) => object.fields.iter().map(|f| f.key.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether `name` (in any casing) is a declared top-level property.
    pub fn declares(&self, name: &str) -> bool {
        match &self.inner.shape {
            Shape::Object(object) => object.field(name).is_some(),
            _ => false,
        }
    }

    pub(crate) fn shape(&self) -> &Shape {
        &self.inner.shape
    }

    pub(crate) fn validator(&self) -> &jsonschema::Validator {
        &self.inner.validator
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("raw", &self.inner.raw)
            .finish_non_exhaustive()
    }
}

impl ObjectShape {
    /// Find a field by normalized key or wire name.
    pub(crate) fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.wire == name || f.key == name)
            .or_else(|| {
                let key = normalize_key(name);
                self.fields.iter().find(|f| f.key == key)
            })
    }
}

impl Shape {
    fn derive(schema: &Value, options: SchemaOptions) -> Shape {
        let Some(obj) = schema.as_object() else {
            return Shape::Any;
        };

        if let Some(Value::Array(parts)) = obj.get("allOf") {
            return Self::merge_all_of(parts, options);
        }

        let declared_type = match obj.get("type") {
            Some(Value::String(t)) => Some(t.as_str()),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(|t| t.as_str())
                .find(|t| *t != "null"),
            _ => None,
        };

        match declared_type {
            Some("object") => Shape::Object(Self::object_shape(obj, options)),
            Some("array") => Shape::Array(Box::new(
                obj.get("items")
                    .map(|items| Self::derive(items, options))
                    .unwrap_or(Shape::Any),
            )),
            Some("integer") => Shape::Integer,
            Some("number") => Shape::Number,
            Some("boolean") => Shape::Boolean,
            Some("string") => Shape::String,
            _ if obj.contains_key("properties") => Shape::Object(Self::object_shape(obj, options)),
            _ if obj.contains_key("items") => Shape::Array(Box::new(
                obj.get("items")
                    .map(|items| Self::derive(items, options))
                    .unwrap_or(Shape::Any),
            )),
            _ => Shape::Any,
        }
    }

    fn object_shape(obj: &Map<String, Value>, options: SchemaOptions) -> ObjectShape {
        let required: Vec<&str> = obj
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();

        let fields: Vec<Field> = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| Field {
                        key: normalize_key(name),
                        wire: name.clone(),
                        required: required.contains(&name.as_str()),
                        default: if options.use_defaults {
                            prop.get("default").cloned()
                        } else {
                            None
                        },
                        shape: Self::derive(prop, options),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let open = match obj.get("additionalProperties") {
            Some(Value::Bool(allowed)) => *allowed,
            Some(Value::Object(_)) => true,
            _ => fields.is_empty(),
        };

        ObjectShape { fields, open }
    }

    fn merge_all_of(parts: &[Value], options: SchemaOptions) -> Shape {
        let mut fields: Vec<Field> = Vec::new();
        let mut open = false;
        let mut saw_object = false;

        for part in parts {
            if let Shape::Object(object) = Self::derive(part, options) {
                saw_object = true;
                open |= object.open && object.fields.is_empty();
                for field in object.fields {
                    if !fields.iter().any(|f| f.wire == field.wire) {
                        fields.push(field);
                    }
                }
            }
        }

        if saw_object {
            Shape::Object(ObjectShape { fields, open })
        } else {
            Shape::Any
        }
    }
}
