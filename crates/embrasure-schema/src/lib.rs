//! Parameter schemas for Embrasure routes.
//!
//! Builds one schema per parameter placement from JSON Schema fragments and
//! coerces caller-supplied values against it: keys are matched by their
//! normalized (lowercase-hyphenated) name or their wire name, scalar strings
//! are converted to the declared type, undeclared keys are dropped, and the
//! result is validated with `jsonschema`.

mod coerce;
pub mod error;
pub mod keys;
pub mod refs;
pub mod schema;

pub use error::{CoercionError, SchemaError, Violation};
pub use keys::normalize_key;
pub use schema::{FieldDecl, Schema, SchemaOptions};
