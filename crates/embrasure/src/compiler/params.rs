//! Parameter grouping by placement.

use serde_json::{json, Value};

use embrasure_schema::{normalize_key, FieldDecl, Schema, SchemaOptions};
use embrasure_spec_parser::{Parameter, ParameterLocation};

use crate::error::CompileError;
use crate::route::{BodySchema, Placement, PlacementSchemas};

/// Build one schema per placement from a route's parameter declarations.
///
/// Placements without parameters get no schema. Path parameters are always
/// required. Only the first body parameter is used; cookie parameters are
/// not part of a request descriptor and are skipped.
pub fn group_parameters(
    route_name: &str,
    params: &[Parameter],
    definitions: &Value,
    options: SchemaOptions,
) -> Result<PlacementSchemas, CompileError> {
    let mut path = Vec::new();
    let mut query = Vec::new();
    let mut form = Vec::new();
    let mut header = Vec::new();
    let mut body: Option<&Parameter> = None;

    for param in params {
        let schema = param.schema.clone().unwrap_or_else(|| json!({}));
        match param.location {
            ParameterLocation::Path => path.push(FieldDecl::new(&param.name, true, schema)),
            ParameterLocation::Query => {
                query.push(FieldDecl::new(&param.name, param.required, schema))
            }
            ParameterLocation::Header => {
                header.push(FieldDecl::new(&param.name, param.required, schema))
            }
            ParameterLocation::FormData => {
                form.push(FieldDecl::new(&param.name, param.required, schema))
            }
            ParameterLocation::Body => {
                if body.is_some() {
                    tracing::debug!(
                        route = route_name,
                        parameter = %param.name,
                        "ignoring additional body parameter"
                    );
                } else {
                    body = Some(param);
                }
            }
            ParameterLocation::Cookie => {
                tracing::debug!(
                    route = route_name,
                    parameter = %param.name,
                    "skipping cookie parameter"
                );
            }
        }
    }

    let object = |placement: Placement, fields: Vec<FieldDecl>| {
        if fields.is_empty() {
            return Ok(None);
        }
        Schema::object(&fields, definitions, options)
            .map(Some)
            .map_err(|source| CompileError::Schema {
                location: format!("{} {} parameters", route_name, placement),
                source,
            })
    };

    let body = match body {
        Some(param) => {
            let raw = param.schema.clone().unwrap_or_else(|| json!({}));
            let schema = Schema::from_json(&raw, definitions, options).map_err(|source| {
                CompileError::Schema {
                    location: format!("{} body parameter '{}'", route_name, param.name),
                    source,
                }
            })?;
            Some(BodySchema {
                name: param.name.clone(),
                key: normalize_key(&param.name),
                required: param.required,
                schema,
            })
        }
        None => None,
    };

    Ok(PlacementSchemas {
        path: object(Placement::Path, path)?,
        query: object(Placement::Query, query)?,
        body,
        form: object(Placement::Form, form)?,
        header: object(Placement::Header, header)?,
    })
}
