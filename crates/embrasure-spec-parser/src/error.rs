use thiserror::Error;

/// Errors produced while reading an API description (E1001–E1004).
#[derive(Debug, Error)]
pub enum ParseError {
    /// E1001: Document is neither Swagger 2.0 nor OpenAPI 3.x.
    #[error("E1001: not a valid Swagger 2.0 or OpenAPI 3.x document")]
    UnknownFormat,

    /// E1002: YAML/JSON parse error.
    #[error("E1002: parse error: {0}")]
    ParseError(String),

    /// E1003: Unresolved $ref.
    #[error("E1003: unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// E1004: Structural error in the document.
    #[error("E1004: schema error: {0}")]
    SchemaError(String),

    /// I/O error reading the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
