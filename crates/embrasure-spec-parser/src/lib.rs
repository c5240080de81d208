//! Swagger 2.0 and OpenAPI 3.x document reader.
//!
//! Reads YAML/JSON API descriptions and flattens `paths` into a list of
//! operations with their parameters, request bodies and responses.
//! Auto-detects the format from the root `swagger` or `openapi` field.

pub mod error;
pub mod model;
pub mod parser;

pub use error::ParseError;
pub use model::{ApiSpec, Operation, Parameter, ParameterLocation, ResponseDecl, SpecFormat};
pub use parser::{parse_spec, parse_spec_file, resolve_ref};
