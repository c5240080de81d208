//! Per-call build state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use embrasure_interceptor::PipelineContext;
use embrasure_schema::{normalize_key, Schema};
use embrasure_telemetry::log_coercion_failure;

use crate::error::BuildError;
use crate::route::{Method, PathToken, Placement, RouteDescriptor};

/// Params key holding the request body; wins over the nested and flat
/// body conventions.
pub const BODY_KEY: &str = "embrasure/body";

/// The request being accumulated by the chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Caller-supplied parameters, always an object.
    pub params: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_params: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
}

impl Request {
    /// The finished request, without `params`.
    pub fn to_descriptor(&self, route: &str) -> Result<RequestDescriptor, BuildError> {
        let method = self.method.ok_or_else(|| BuildError::Incomplete {
            route: route.to_string(),
            field: "method",
        })?;
        let url = self.url.clone().ok_or_else(|| BuildError::Incomplete {
            route: route.to_string(),
            field: "url",
        })?;

        Ok(RequestDescriptor {
            method,
            url,
            query_params: self.query_params.clone(),
            body: self.body.clone(),
            form_params: self.form_params.clone(),
            headers: self.headers.clone(),
        })
    }
}

/// A fully-formed HTTP request, ready for a transport to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Map<String, Value>>,
}

/// Renders path templates against a base address.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    base_url: Arc<str>,
}

impl PathBuilder {
    /// A trailing `/` on `base_url` is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Render `route`'s template with `values`, prefixed with the base URL.
    ///
    /// Values are looked up by wire name, then by normalized name, and
    /// percent-encoded.
    pub fn build(
        &self,
        route: &RouteDescriptor,
        values: &Map<String, Value>,
    ) -> Result<String, BuildError> {
        let mut url = String::from(&*self.base_url);
        for token in route.path_template.tokens() {
            match token {
                PathToken::Literal(s) => url.push_str(s),
                PathToken::Param { param } => {
                    let value = lookup(values, param).ok_or_else(|| {
                        BuildError::MissingPathParam {
                            route: route.route_name.clone(),
                            name: param.clone(),
                        }
                    })?;
                    url.push_str(&encode_segment(&scalar_string(value)));
                }
            }
        }
        Ok(url)
    }

    /// Coerce `params` against the route's path schema, then render.
    pub fn render(&self, route: &RouteDescriptor, params: &Value) -> Result<String, BuildError> {
        let coerced = match &route.schemas.path {
            Some(schema) => coerce(route, Placement::Path, schema, params)?,
            None => params.clone(),
        };
        let empty = Map::new();
        self.build(route, coerced.as_object().unwrap_or(&empty))
    }
}

fn lookup<'a>(values: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let found = values.get(name).or_else(|| {
        let key = normalize_key(name);
        values
            .get(&key)
            .or_else(|| values.iter().find(|(k, _)| normalize_key(k) == key).map(|(_, v)| v))
    });
    found.filter(|v| !v.is_null())
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Coerce `data` against `schema`, naming the route and placement on failure.
pub(crate) fn coerce(
    route: &RouteDescriptor,
    placement: Placement,
    schema: &Schema,
    data: &Value,
) -> Result<Value, BuildError> {
    schema.coerce(data).map_err(|source| {
        log_coercion_failure!(
            route = %route.route_name,
            placement = %placement,
            fields = ?source.fields(),
            "parameters failed coercion"
        );
        BuildError::Coercion {
            route: route.route_name.clone(),
            placement,
            source,
        }
    })
}

/// Mutable state threaded through the interceptor chain for one build.
pub struct Context {
    pub request: Request,
    /// Once set, the remaining enter hooks are skipped.
    pub response: Option<RequestDescriptor>,
    handler: Arc<RouteDescriptor>,
    path_builder: PathBuilder,
    error: Option<BuildError>,
}

impl Context {
    pub fn new(handler: Arc<RouteDescriptor>, path_builder: PathBuilder, params: Value) -> Self {
        Self {
            request: Request {
                params,
                ..Default::default()
            },
            response: None,
            handler,
            path_builder,
            error: None,
        }
    }

    /// The route being built.
    pub fn handler(&self) -> &RouteDescriptor {
        &self.handler
    }

    pub fn path_builder(&self) -> &PathBuilder {
        &self.path_builder
    }

    /// The error being unwound, visible to leave hooks.
    pub fn error(&self) -> Option<&BuildError> {
        self.error.as_ref()
    }

    /// Clear the error being unwound, returning it.
    pub fn take_error(&mut self) -> Option<BuildError> {
        self.error.take()
    }

    /// Coerce the params against a placement's schema.
    ///
    /// `None` when the route has no schema for `placement` or coercion leaves
    /// nothing.
    pub fn coerce_params(
        &self,
        placement: Placement,
    ) -> Result<Option<Map<String, Value>>, BuildError> {
        let Some(schema) = self.handler.schemas.get(placement) else {
            return Ok(None);
        };
        match coerce(&self.handler, placement, schema, &self.request.params)? {
            Value::Object(map) if !map.is_empty() => Ok(Some(map)),
            _ => Ok(None),
        }
    }
}

impl PipelineContext for Context {
    type Error = BuildError;

    fn has_response(&self) -> bool {
        self.response.is_some()
    }

    fn error_slot(&mut self) -> &mut Option<BuildError> {
        &mut self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile_routes, object_schema, CompileOptions, RouteDefinition};
    use serde_json::json;

    fn route(def: RouteDefinition) -> Arc<RouteDescriptor> {
        let mut routes = compile_routes(vec![def], &CompileOptions::default()).unwrap();
        Arc::new(routes.remove(0))
    }

    fn pet_route() -> Arc<RouteDescriptor> {
        route(
            RouteDefinition::new(
                "get-pet",
                Method::Get,
                vec![PathToken::literal("/pets/"), PathToken::param("petId")],
            )
            .with_path_schema(object_schema(
                &[("petId", json!({"type": "integer"}))],
                &["petId"],
            )),
        )
    }

    #[test]
    fn path_builder_renders_with_base() {
        let builder = PathBuilder::new("https://api.example.com/");
        assert_eq!(builder.base_url(), "https://api.example.com");

        let url = builder.render(&pet_route(), &json!({"pet-id": 123})).unwrap();
        assert_eq!(url, "https://api.example.com/pets/123");
    }

    #[test]
    fn path_values_accept_wire_names_and_are_encoded() {
        let route = route(RouteDefinition::new(
            "get-file",
            Method::Get,
            vec![PathToken::literal("/files/"), PathToken::param("name")],
        ));
        let builder = PathBuilder::new("");
        let url = builder.render(&route, &json!({"name": "a b/c"})).unwrap();
        assert_eq!(url, "/files/a%20b%2Fc");
    }

    #[test]
    fn missing_path_value() {
        let route = route(RouteDefinition::new(
            "get-file",
            Method::Get,
            vec![PathToken::literal("/files/"), PathToken::param("name")],
        ));
        let err = PathBuilder::new("").render(&route, &json!({})).unwrap_err();
        assert!(matches!(err, BuildError::MissingPathParam { ref name, .. } if name == "name"));
    }

    #[test]
    fn path_schema_coercion_errors_name_the_placement() {
        let err = PathBuilder::new("")
            .render(&pet_route(), &json!({"pet-id": "abc"}))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::Coercion {
                placement: Placement::Path,
                ..
            }
        ));
        assert_eq!(err.fields(), vec!["petId"]);
    }

    #[test]
    fn request_descriptor_omits_absent_fields() {
        let request = Request {
            params: json!({"id": 1}),
            method: Some(Method::Get),
            url: Some("/pets/1".into()),
            ..Default::default()
        };
        let descriptor = request.to_descriptor("get-pet").unwrap();
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"method": "get", "url": "/pets/1"})
        );
    }

    #[test]
    fn request_without_url_is_incomplete() {
        let request = Request {
            method: Some(Method::Get),
            ..Default::default()
        };
        let err = request.to_descriptor("get-pet").unwrap_err();
        assert!(matches!(err, BuildError::Incomplete { field: "url", .. }));
    }

    #[test]
    fn coerce_params_skips_missing_schemas_and_empty_results() {
        let ctx = Context::new(pet_route(), PathBuilder::new(""), json!({"pet-id": "7"}));
        assert!(ctx.coerce_params(Placement::Query).unwrap().is_none());
        let path = ctx.coerce_params(Placement::Path).unwrap().unwrap();
        assert_eq!(Value::Object(path), json!({"petId": 7}));
        assert!(!ctx.has_response());
        assert!(ctx.error().is_none());
    }
}
