//! Hand-written route tables.
//!
//! A route table lists routes directly instead of deriving them from a
//! Swagger/OpenAPI document. Each placement schema is a JSON Schema object
//! whose properties are the parameters:
//!
//! ```yaml
//! - routeName: get-pet
//!   method: get
//!   pathParts: ["/pets/", {param: id}]
//!   pathSchema:
//!     type: object
//!     required: [id]
//!     properties:
//!       id: {type: integer}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use embrasure_interceptor::Interceptor;

use crate::context::Context;
use crate::error::CompileError;
use crate::route::{Method, PathToken};

/// A route as written in a route table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    pub route_name: String,
    pub method: Method,
    pub path_parts: Vec<PathToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<Value>,
    /// Name used for the nested-body convention (default: `body`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Route-specific interceptors. Only settable from code.
    #[serde(skip)]
    pub interceptors: Vec<Interceptor<Context>>,
}

impl RouteDefinition {
    pub fn new(route_name: impl Into<String>, method: Method, path_parts: Vec<PathToken>) -> Self {
        Self {
            route_name: route_name.into(),
            method,
            path_parts,
            path_schema: None,
            query_schema: None,
            body_schema: None,
            body_name: None,
            form_schema: None,
            headers_schema: None,
            summary: None,
            interceptors: Vec::new(),
        }
    }

    pub fn with_path_schema(mut self, schema: Value) -> Self {
        self.path_schema = Some(schema);
        self
    }

    pub fn with_query_schema(mut self, schema: Value) -> Self {
        self.query_schema = Some(schema);
        self
    }

    pub fn with_body_schema(mut self, schema: Value) -> Self {
        self.body_schema = Some(schema);
        self
    }

    pub fn with_body_name(mut self, name: impl Into<String>) -> Self {
        self.body_name = Some(name.into());
        self
    }

    pub fn with_form_schema(mut self, schema: Value) -> Self {
        self.form_schema = Some(schema);
        self
    }

    pub fn with_headers_schema(mut self, schema: Value) -> Self {
        self.headers_schema = Some(schema);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_interceptor(mut self, interceptor: Interceptor<Context>) -> Self {
        self.interceptors.push(interceptor);
        self
    }
}

/// Read a route table from YAML or JSON text.
pub fn parse_route_table(input: &str) -> Result<Vec<RouteDefinition>, CompileError> {
    serde_yaml::from_str(input).map_err(|e| CompileError::RouteTable(e.to_string()))
}
