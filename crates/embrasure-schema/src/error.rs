use serde::Serialize;
use thiserror::Error;

/// Errors produced while constructing a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unresolved $ref: {0}")]
    UnresolvedRef(String),

    #[error("invalid schema: {0}")]
    Invalid(String),
}

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path to the offending value (empty for the root).
    pub field: String,
    pub reason: String,
}

/// Supplied data does not conform to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// Required keys are absent and have no default.
    #[error("missing required keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    /// Values are present but fail validation after coercion.
    #[error("{}", describe(.violations))]
    Invalid { violations: Vec<Violation> },
}

impl CoercionError {
    /// The offending fields, in report order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            CoercionError::MissingKeys { keys } => keys.iter().map(String::as_str).collect(),
            CoercionError::Invalid { violations } => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
        }
    }
}

fn describe(violations: &[Violation]) -> String {
    let parts: Vec<String> = violations
        .iter()
        .map(|v| {
            if v.field.is_empty() {
                v.reason.clone()
            } else {
                format!("{}: {}", v.field, v.reason)
            }
        })
        .collect();
    format!("invalid values: {}", parts.join("; "))
}
