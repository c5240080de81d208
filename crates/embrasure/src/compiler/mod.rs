//! Route compilation.
//!
//! Turns an [`ApiSpec`] or a hand-written route table into route
//! descriptors. Compilation is pure and deterministic: the same input always
//! yields the same routes in the same order.

mod params;
mod path;
mod table;

pub use params::group_parameters;
pub use path::tokenize;
pub use table::{parse_route_table, RouteDefinition};

use std::collections::HashMap;

use serde_json::{json, Value};

use embrasure_schema::{normalize_key, Schema, SchemaOptions};
use embrasure_spec_parser::{ApiSpec, Operation};
use embrasure_telemetry::{log_route_duplicate, log_spec_compiled};

use crate::error::CompileError;
use crate::route::{
    BodySchema, Method, PathTemplate, PlacementSchemas, ResponseSchema, RouteDescriptor,
    StatusMatcher,
};

/// Options applied to every route of a compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Fill missing parameters from their declared `default` (default: true).
    pub use_defaults: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { use_defaults: true }
    }
}

impl CompileOptions {
    fn schema_options(&self) -> SchemaOptions {
        SchemaOptions {
            use_defaults: self.use_defaults,
        }
    }
}

/// Compile every operation of `spec` into a route descriptor.
///
/// Fails on the first operation without an `operationId`, with an
/// unsupported method, or with a malformed path template. When two
/// operations normalize to the same route name, the later one wins.
pub fn compile(
    spec: &ApiSpec,
    options: &CompileOptions,
) -> Result<Vec<RouteDescriptor>, CompileError> {
    let mut routes = Vec::with_capacity(spec.operations.len());

    for op in &spec.operations {
        routes.push(compile_operation(spec, op, options)?);
    }

    let routes = dedupe(routes);
    log_spec_compiled!(
        title = %spec.title,
        format = spec.format.as_str(),
        routes = routes.len(),
        "compiled API description"
    );
    Ok(routes)
}

fn compile_operation(
    spec: &ApiSpec,
    op: &Operation,
    options: &CompileOptions,
) -> Result<RouteDescriptor, CompileError> {
    let location = format!("{} {}", op.method.to_uppercase(), op.path);

    let operation_id = op
        .operation_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CompileError::MissingOperationId(location.clone()))?;
    let route_name = normalize_key(operation_id);

    let method =
        Method::parse(&op.method).ok_or_else(|| CompileError::UnknownMethod(op.method.clone()))?;

    let path_template = tokenize(&op.path)?.with_prefix(&spec.base_path);

    let schemas = group_parameters(
        &route_name,
        &op.parameters,
        &spec.definitions,
        options.schema_options(),
    )?;

    let mut response_schemas = Vec::with_capacity(op.responses.len());
    for response in &op.responses {
        let Some(status) = StatusMatcher::parse(&response.status) else {
            tracing::debug!(
                route = %route_name,
                status = %response.status,
                "skipping response with unrecognized status"
            );
            continue;
        };
        let body = match &response.schema {
            Some(raw) => Some(
                Schema::from_json(raw, &spec.definitions, options.schema_options()).map_err(
                    |source| CompileError::Schema {
                        location: format!("{} response {}", route_name, response.status),
                        source,
                    },
                )?,
            ),
            None => None,
        };
        response_schemas.push(ResponseSchema {
            status,
            description: response.description.clone(),
            body,
        });
    }

    tracing::debug!(route = %route_name, method = %method, path = %path_template, "compiled route");

    Ok(RouteDescriptor {
        route_name,
        method,
        path_template,
        schemas,
        response_schemas,
        raw_definition: op.raw.clone(),
        interceptors: Vec::new(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        deprecated: op.deprecated,
        consumes: op.consumes.clone(),
        produces: op.produces.clone(),
    })
}

/// Compile a hand-written route table.
///
/// Route names are normalized like operation ids; duplicates resolve the
/// same way as for documents.
pub fn compile_routes(
    definitions: Vec<RouteDefinition>,
    options: &CompileOptions,
) -> Result<Vec<RouteDescriptor>, CompileError> {
    let schema_options = options.schema_options();
    let mut routes = Vec::with_capacity(definitions.len());

    for def in definitions {
        if def.route_name.trim().is_empty() {
            return Err(CompileError::MissingOperationId(format!(
                "route table entry {}",
                routes.len()
            )));
        }
        let route_name = normalize_key(&def.route_name);
        let raw_definition = serde_json::to_value(&def)
            .map_err(|e| CompileError::RouteTable(format!("{}: {}", route_name, e)))?;

        let build = |placement: &str, raw: &Option<Value>| -> Result<Option<Schema>, CompileError> {
            raw.as_ref()
                .map(|raw| Schema::from_json(raw, &Value::Null, schema_options))
                .transpose()
                .map_err(|source| CompileError::Schema {
                    location: format!("{} {} schema", route_name, placement),
                    source,
                })
        };

        let body = match build("body", &def.body_schema)? {
            Some(schema) => {
                let name = def.body_name.clone().unwrap_or_else(|| "body".to_string());
                Some(BodySchema {
                    key: normalize_key(&name),
                    name,
                    required: true,
                    schema,
                })
            }
            None => None,
        };

        let schemas = PlacementSchemas {
            path: build("path", &def.path_schema)?,
            query: build("query", &def.query_schema)?,
            body,
            form: build("form", &def.form_schema)?,
            header: build("headers", &def.headers_schema)?,
        };

        routes.push(RouteDescriptor {
            method: def.method,
            path_template: PathTemplate::from_tokens(def.path_parts),
            schemas,
            response_schemas: Vec::new(),
            raw_definition,
            interceptors: def.interceptors,
            summary: def.summary,
            description: None,
            deprecated: false,
            consumes: Vec::new(),
            produces: Vec::new(),
            route_name,
        });
    }

    let routes = dedupe(routes);
    log_spec_compiled!(
        format = "route-table",
        routes = routes.len(),
        "compiled route table"
    );
    Ok(routes)
}

/// Keep only the last route registered under each name, preserving order.
fn dedupe(routes: Vec<RouteDescriptor>) -> Vec<RouteDescriptor> {
    let mut last: HashMap<String, usize> = HashMap::with_capacity(routes.len());
    for (i, route) in routes.iter().enumerate() {
        if let Some(previous) = last.insert(route.route_name.clone(), i) {
            log_route_duplicate!(
                route = %route.route_name,
                replaced = %routes[previous].path_template,
                by = %route.path_template,
                "duplicate route name, keeping the later route"
            );
        }
    }

    routes
        .into_iter()
        .enumerate()
        .filter(|(i, route)| last.get(&route.route_name) == Some(i))
        .map(|(_, route)| route)
        .collect()
}

/// Build an object JSON Schema from `(name, schema)` pairs, for route
/// tables written in code.
pub fn object_schema(properties: &[(&str, Value)], required: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    let mut schema = json!({"type": "object", "properties": props});
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}
