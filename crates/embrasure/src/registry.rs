//! Route registry and client facade.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use embrasure_interceptor::{execute, Interceptor};
use embrasure_schema::normalize_key;
use embrasure_spec_parser::{parse_spec, parse_spec_file, ApiSpec};
use embrasure_telemetry::log_request_built;

use crate::compiler::{compile, compile_routes, CompileOptions, RouteDefinition};
use crate::context::{Context, PathBuilder, RequestDescriptor};
use crate::error::{BuildError, CompileError};
use crate::interceptors::default_interceptors;
use crate::route::{Method, Placement, RouteDescriptor};

/// Compiled routes plus the interceptor chain used to build requests.
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Registry {
    path_builder: PathBuilder,
    routes: Vec<Arc<RouteDescriptor>>,
    index: HashMap<String, usize>,
    interceptors: Vec<Interceptor<Context>>,
}

/// What [`Registry::explore_route`] reports about a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub route_name: String,
    pub method: Method,
    /// Path template, parameters written `{name}`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub deprecated: bool,
    /// Normalized parameter names accepted per placement.
    pub parameters: BTreeMap<Placement, Vec<String>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Compile a Swagger/OpenAPI document given as YAML or JSON text.
    pub fn from_spec_str(input: &str, base_url: Option<&str>) -> Result<Self, CompileError> {
        Self::builder().maybe_base_url(base_url).build_from_str(input)
    }

    /// Compile a Swagger/OpenAPI document read from disk.
    pub fn from_spec_file(path: &Path, base_url: Option<&str>) -> Result<Self, CompileError> {
        Self::builder().maybe_base_url(base_url).build_from_file(path)
    }

    /// Compile a hand-written route table.
    pub fn from_routes(routes: Vec<RouteDefinition>, base_url: &str) -> Result<Self, CompileError> {
        Self::builder().base_url(base_url).build_from_routes(routes)
    }

    pub fn base_url(&self) -> &str {
        self.path_builder.base_url()
    }

    /// Routes in compilation order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter().map(|r| r.as_ref())
    }

    /// Look up a route by name, in normalized or original form.
    pub fn route(&self, name: &str) -> Option<&RouteDescriptor> {
        self.lookup(name).map(|r| r.as_ref())
    }

    /// The chain every build runs, before route-specific interceptors.
    pub fn interceptors(&self) -> &[Interceptor<Context>] {
        &self.interceptors
    }

    fn lookup(&self, name: &str) -> Option<&Arc<RouteDescriptor>> {
        let index = match self.index.get(name) {
            Some(i) => *i,
            None => *self.index.get(&normalize_key(name))?,
        };
        self.routes.get(index)
    }

    /// Render the URL of `route_name`; `Ok(None)` if there is no such route.
    ///
    /// Only path parameters are used.
    pub fn url_for(&self, route_name: &str, params: &Value) -> Result<Option<String>, BuildError> {
        let Some(route) = self.lookup(route_name) else {
            return Ok(None);
        };
        let params = normalize_params(params)?;
        self.path_builder.render(route, &params).map(Some)
    }

    /// Build the request for `route_name`; `Ok(None)` if there is no such
    /// route.
    ///
    /// Runs the registry chain followed by the route's own interceptors.
    pub fn request_for(
        &self,
        route_name: &str,
        params: &Value,
    ) -> Result<Option<RequestDescriptor>, BuildError> {
        let Some(route) = self.lookup(route_name) else {
            return Ok(None);
        };
        let params = normalize_params(params)?;

        let ctx = Context::new(Arc::clone(route), self.path_builder.clone(), params);
        let chain = self.interceptors.iter().chain(route.interceptors.iter());
        let mut ctx = execute(ctx, chain)?;

        let descriptor = ctx.response.take().ok_or_else(|| BuildError::Incomplete {
            route: route.route_name.clone(),
            field: "response",
        })?;
        log_request_built!(
            route = %route.route_name,
            method = %descriptor.method,
            url = %descriptor.url,
            "built request"
        );
        Ok(Some(descriptor))
    }

    /// `(route name, summary)` for every route, in order.
    pub fn explore(&self) -> Vec<(&str, Option<&str>)> {
        self.routes
            .iter()
            .map(|r| (r.route_name.as_str(), r.summary.as_deref()))
            .collect()
    }

    /// Describe one route; `None` if there is no such route.
    pub fn explore_route(&self, route_name: &str) -> Option<RouteSummary> {
        let route = self.lookup(route_name)?;

        let mut parameters = BTreeMap::new();
        for placement in route.schemas.present() {
            let names: Vec<String> = match (placement, &route.schemas.body) {
                (Placement::Body, Some(body)) if body.schema.keys().is_empty() => {
                    vec![body.key.clone()]
                }
                _ => route
                    .schemas
                    .get(placement)
                    .map(|s| s.keys().into_iter().map(String::from).collect())
                    .unwrap_or_default(),
            };
            parameters.insert(placement, names);
        }

        Some(RouteSummary {
            route_name: route.route_name.clone(),
            method: route.method,
            path: route.path_template.to_string(),
            summary: route.summary.clone(),
            description: route.description.clone(),
            deprecated: route.deprecated,
            parameters,
        })
    }
}

/// `null` means no parameters; anything else must be an object.
fn normalize_params(params: &Value) -> Result<Value, BuildError> {
    match params {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(params.clone()),
        other => Err(BuildError::InvalidParams(kind(other).to_string())),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Configures and builds a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    base_url: Option<String>,
    chain: Option<Vec<Interceptor<Context>>>,
    extra: Vec<Interceptor<Context>>,
    options: CompileOptions,
}

impl RegistryBuilder {
    /// Base address prefixed to every URL. Defaults to the document's
    /// advertised server, or empty.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn maybe_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = Some(url.to_string());
        }
        self
    }

    /// Append an interceptor after the chain.
    pub fn interceptor(mut self, interceptor: Interceptor<Context>) -> Self {
        self.extra.push(interceptor);
        self
    }

    /// Append interceptors after the chain, in order.
    pub fn interceptors(
        mut self,
        interceptors: impl IntoIterator<Item = Interceptor<Context>>,
    ) -> Self {
        self.extra.extend(interceptors);
        self
    }

    /// Replace the default chain. Appended interceptors still follow it.
    pub fn chain(mut self, chain: Vec<Interceptor<Context>>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn compile_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build_from_spec(self, spec: &ApiSpec) -> Result<Registry, CompileError> {
        let routes = compile(spec, &self.options)?;
        let fallback = spec.default_base_url.clone();
        Ok(self.build(routes, fallback))
    }

    pub fn build_from_str(self, input: &str) -> Result<Registry, CompileError> {
        let spec = parse_spec(input)?;
        self.build_from_spec(&spec)
    }

    pub fn build_from_file(self, path: &Path) -> Result<Registry, CompileError> {
        let spec = parse_spec_file(path)?;
        self.build_from_spec(&spec)
    }

    pub fn build_from_routes(
        self,
        routes: Vec<RouteDefinition>,
    ) -> Result<Registry, CompileError> {
        let routes = compile_routes(routes, &self.options)?;
        Ok(self.build(routes, None))
    }

    fn build(self, routes: Vec<RouteDescriptor>, fallback_base: Option<String>) -> Registry {
        let base_url = self.base_url.or(fallback_base).unwrap_or_default();

        let mut interceptors = self.chain.unwrap_or_else(default_interceptors);
        interceptors.extend(self.extra);

        let index = routes
            .iter()
            .enumerate()
            .map(|(i, r)| (r.route_name.clone(), i))
            .collect();

        Registry {
            path_builder: PathBuilder::new(&base_url),
            routes: routes.into_iter().map(Arc::new).collect(),
            index,
            interceptors,
        }
    }
}
