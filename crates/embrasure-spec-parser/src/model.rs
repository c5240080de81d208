use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed API description (Swagger 2.0 or OpenAPI 3.x).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Source file name, when read from disk.
    pub filename: Option<String>,
    /// The format detected from the root field.
    pub format: SpecFormat,
    /// The document version string (e.g. "2.0", "3.0.3").
    pub version: String,
    /// The `info.title` field.
    pub title: String,
    /// The `info.version` field.
    pub api_version: String,
    /// Prefix for every path template (Swagger `basePath`, or a relative
    /// OpenAPI server URL). Empty when there is none.
    pub base_path: String,
    /// Absolute base address advertised by the document, if any.
    pub default_base_url: Option<String>,
    /// Operations in document order.
    pub operations: Vec<Operation>,
    /// Document subtrees that `$ref` pointers resolve against
    /// (`definitions`, `parameters`, `components`).
    pub definitions: Value,
}

/// Detected document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    Swagger,
    OpenApi,
}

impl SpecFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecFormat::Swagger => "swagger",
            SpecFormat::OpenApi => "openapi",
        }
    }
}

/// A single API operation (path + method).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// The path template as declared (e.g. "/pets/{id}"), without base path.
    pub path: String,
    /// The HTTP method (lowercase).
    pub method: String,
    /// The `operationId`, if present.
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Path-level and operation-level parameters, request body included.
    pub parameters: Vec<Parameter>,
    /// Declared responses in document order.
    pub responses: Vec<ResponseDecl>,
    /// Request media types.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Response media types.
    #[serde(default)]
    pub produces: Vec<String>,
    /// The operation object exactly as written in the document.
    pub raw: Value,
}

/// Where a parameter is placed in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    FormData,
}

impl ParameterLocation {
    /// Parse the `in` field of a parameter object.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            "formData" => Some(Self::FormData),
            _ => None,
        }
    }
}

/// A parameter declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// The wire name, exactly as declared.
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    /// JSON Schema for the value. For Swagger 2.0 non-body parameters this is
    /// assembled from the parameter's own type fields. May contain `$ref`.
    pub schema: Option<Value>,
}

/// A declared response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseDecl {
    /// Status key as written ("200", "4XX", "default").
    pub status: String,
    pub description: Option<String>,
    /// Body schema, if any. May contain `$ref`.
    pub schema: Option<Value>,
}
