use thiserror::Error;

use embrasure_schema::{CoercionError, SchemaError};

use crate::route::Placement;

/// Errors raised while compiling an API description into routes.
///
/// Compilation is all-or-nothing: any error aborts the whole description.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Document could not be read.
    #[error(transparent)]
    Parse(#[from] embrasure_spec_parser::ParseError),

    /// E1004: A parameter or response schema could not be built.
    #[error("E1004: schema error in {location}: {source}")]
    Schema {
        location: String,
        #[source]
        source: SchemaError,
    },

    /// E1020: Operation has no operationId, so it cannot be named.
    #[error("E1020: operation has no operationId: {0}")]
    MissingOperationId(String),

    /// E1021: Method is not a standard HTTP verb.
    #[error("E1021: unknown HTTP method '{0}'")]
    UnknownMethod(String),

    /// E1054: Path template is malformed.
    #[error("E1054: invalid path template: {0}")]
    InvalidPathTemplate(String),

    /// Hand-written route table could not be read.
    #[error("invalid route table: {0}")]
    RouteTable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while building a request for a known route.
///
/// An unknown route name is not an error; lookups return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// E2001: Supplied parameters do not conform to a placement's schema.
    #[error("E2001: {route}: invalid {placement} parameters: {source}")]
    Coercion {
        route: String,
        placement: Placement,
        #[source]
        source: CoercionError,
    },

    /// E2002: Path template references a parameter with no value.
    #[error("E2002: {route}: no value for path parameter '{name}'")]
    MissingPathParam { route: String, name: String },

    /// E2003: The chain finished without producing part of the request.
    #[error("E2003: {route}: request has no {field}")]
    Incomplete { route: String, field: &'static str },

    /// E2004: Parameters were not a key/value mapping.
    #[error("E2004: parameters must be an object, got {0}")]
    InvalidParams(String),

    /// E2005: A user interceptor failed.
    #[error("E2005: interceptor '{name}' failed: {message}")]
    Interceptor { name: String, message: String },
}

impl BuildError {
    /// Fields named by a coercion failure, empty for other errors.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            BuildError::Coercion { source, .. } => source.fields(),
            BuildError::MissingPathParam { name, .. } => vec![name.as_str()],
            _ => Vec::new(),
        }
    }
}
