use serde_json::{Map, Value};

use crate::error::ParseError;
use crate::model::{ApiSpec, Operation, Parameter, ParameterLocation, ResponseDecl, SpecFormat};

/// HTTP methods we recognize in path items.
const HTTP_METHODS: &[&str] = &[
    "get", "post", "put", "delete", "patch", "head", "options", "trace",
];

/// Request media types whose body is sent as form fields.
const FORM_MEDIA_TYPES: &[&str] = &["application/x-www-form-urlencoded", "multipart/form-data"];

/// Root keys that `$ref` pointers may target.
const REF_ROOTS: &[&str] = &["definitions", "parameters", "responses", "components"];

/// Swagger 2.0 parameter fields that carry JSON Schema semantics.
const SWAGGER_SCHEMA_FIELDS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

/// Resolve a local JSON Reference like `#/definitions/Pet` from the document root.
///
/// Only local references (`#/...`) are supported. Returns `None` for external refs.
pub fn resolve_ref<'a>(root: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix("#/")?;
    let mut current = root;
    for segment in pointer.split('/') {
        let unescaped = segment.replace("~1", "/").replace("~0", "~");
        current = current.get(&unescaped)?;
    }
    Some(current)
}

/// Follow a top-level `$ref` on an object, if there is one.
fn deref<'a>(value: &'a Value, root: &'a Value) -> Result<&'a Value, ParseError> {
    match value.get("$ref").and_then(|v| v.as_str()) {
        Some(ref_str) => {
            resolve_ref(root, ref_str).ok_or_else(|| ParseError::UnresolvedRef(ref_str.to_string()))
        }
        None => Ok(value),
    }
}

/// Parse a Swagger 2.0 or OpenAPI 3.x document from a YAML/JSON string.
pub fn parse_spec(input: &str) -> Result<ApiSpec, ParseError> {
    // Parse YAML (also handles JSON since JSON is valid YAML)
    let root: Value =
        serde_yaml::from_str(input).map_err(|e| ParseError::ParseError(e.to_string()))?;

    let root_obj = root
        .as_object()
        .ok_or_else(|| ParseError::ParseError("document root must be an object".into()))?;

    let (format, version) = detect_format(root_obj)?;

    let info = root_obj
        .get("info")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ParseError::SchemaError("missing 'info' object".into()))?;

    let title = info
        .get("title")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ParseError::SchemaError("missing 'info.title'".into()))?
        .to_string();

    let api_version = info
        .get("version")
        .and_then(|v| v.as_str())
        .unwrap_or("0.0.0")
        .to_string();

    let (base_path, default_base_url) = match format {
        SpecFormat::Swagger => swagger_base(root_obj),
        SpecFormat::OpenApi => openapi_base(root_obj),
    };

    let operations = parse_paths(root_obj, &root, format)?;

    let definitions = Value::Object(
        REF_ROOTS
            .iter()
            .filter_map(|key| root_obj.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect(),
    );

    tracing::debug!(
        title = %title,
        format = format.as_str(),
        operations = operations.len(),
        "parsed API description"
    );

    Ok(ApiSpec {
        filename: None,
        format,
        version,
        title,
        api_version,
        base_path,
        default_base_url,
        operations,
        definitions,
    })
}

/// Parse a document from a file path.
pub fn parse_spec_file(path: &std::path::Path) -> Result<ApiSpec, ParseError> {
    let content = std::fs::read_to_string(path)?;
    let mut spec = parse_spec(&content)?;
    spec.filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());
    Ok(spec)
}

/// Detect whether this is Swagger 2.0 or OpenAPI 3.x and extract the version.
fn detect_format(root: &Map<String, Value>) -> Result<(SpecFormat, String), ParseError> {
    if let Some(version) = root.get("swagger").and_then(|v| v.as_str()) {
        if !version.starts_with("2.") {
            return Err(ParseError::SchemaError(format!(
                "unsupported Swagger version: {} (only 2.x supported)",
                version
            )));
        }
        Ok((SpecFormat::Swagger, version.to_string()))
    } else if let Some(version) = root.get("openapi").and_then(|v| v.as_str()) {
        if !version.starts_with("3.") {
            return Err(ParseError::SchemaError(format!(
                "unsupported OpenAPI version: {} (only 3.x supported)",
                version
            )));
        }
        Ok((SpecFormat::OpenApi, version.to_string()))
    } else {
        Err(ParseError::UnknownFormat)
    }
}

/// Strip a trailing slash so that `basePath + path` never doubles it.
fn trim_base_path(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

/// Swagger 2.0: `basePath`, and `schemes[0]://host` when a host is declared.
/// The base path is not repeated in the base address; routes carry it.
fn swagger_base(root: &Map<String, Value>) -> (String, Option<String>) {
    let base_path = root
        .get("basePath")
        .and_then(|v| v.as_str())
        .map(trim_base_path)
        .unwrap_or_default();

    let default_base_url = root.get("host").and_then(|v| v.as_str()).map(|host| {
        let scheme = root
            .get("schemes")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.as_str())
            .unwrap_or("https");
        format!("{}://{}", scheme, host.trim_end_matches('/'))
    });

    (base_path, default_base_url)
}

/// OpenAPI 3.x: a relative first server URL is a base path, an absolute one
/// is the default base address.
fn openapi_base(root: &Map<String, Value>) -> (String, Option<String>) {
    let server_url = root
        .get("servers")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|s| s.get("url"))
        .and_then(|v| v.as_str());

    match server_url {
        Some(url) if url.starts_with('/') => (trim_base_path(url), None),
        Some(url) if url.contains("://") => (String::new(), Some(trim_base_path(url))),
        _ => (String::new(), None),
    }
}

/// Root-level `consumes`/`produces` defaults (Swagger 2.0 only).
fn media_list(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    obj.get(key).and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    })
}

/// Parse `paths` into operations, preserving document order.
fn parse_paths(
    root: &Map<String, Value>,
    doc: &Value,
    format: SpecFormat,
) -> Result<Vec<Operation>, ParseError> {
    let mut operations = Vec::new();

    let paths = match root.get("paths").and_then(|v| v.as_object()) {
        Some(p) => p,
        None => return Ok(operations), // No paths is valid (empty API)
    };

    let root_consumes = media_list(root, "consumes").unwrap_or_default();
    let root_produces = media_list(root, "produces").unwrap_or_default();

    for (path, path_item) in paths {
        let path_obj = deref(path_item, doc)?.as_object().ok_or_else(|| {
            ParseError::SchemaError(format!("path item for '{}' must be an object", path))
        })?;

        // Path-level parameters (inherited by all operations)
        let path_params = parse_parameters(path_obj, doc, format)?;

        for (method, op_value) in path_obj {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }

            let op_obj = op_value.as_object().ok_or_else(|| {
                ParseError::SchemaError(format!(
                    "operation {} {} must be an object",
                    method.to_uppercase(),
                    path
                ))
            })?;

            let mut params = merge_parameters(&path_params, parse_parameters(op_obj, doc, format)?);

            let mut consumes =
                media_list(op_obj, "consumes").unwrap_or_else(|| root_consumes.clone());
            let produces = match format {
                SpecFormat::Swagger => {
                    media_list(op_obj, "produces").unwrap_or_else(|| root_produces.clone())
                }
                SpecFormat::OpenApi => response_media_types(op_obj, doc)?,
            };

            if format == SpecFormat::OpenApi {
                if let Some((body_params, media_types)) = parse_request_body(op_obj, doc)? {
                    params.extend(body_params);
                    consumes = media_types;
                }
            }

            let operation_id = op_obj
                .get("operationId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let summary = op_obj
                .get("summary")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let description = op_obj
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let deprecated = op_obj
                .get("deprecated")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            let responses = parse_responses(op_obj, doc, format)?;

            operations.push(Operation {
                path: path.clone(),
                method: method.clone(),
                operation_id,
                summary,
                description,
                deprecated,
                parameters: params,
                responses,
                consumes,
                produces,
                raw: op_value.clone(),
            });
        }
    }

    Ok(operations)
}

/// Operation-level parameters override path-level ones with the same name and location.
fn merge_parameters(inherited: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = inherited
        .iter()
        .filter(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(own);
    merged
}

/// Parse `parameters` from a path item or operation object.
fn parse_parameters(
    obj: &Map<String, Value>,
    doc: &Value,
    format: SpecFormat,
) -> Result<Vec<Parameter>, ParseError> {
    let Some(items) = obj.get("parameters").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut params = Vec::with_capacity(items.len());
    for item in items {
        let param_obj = deref(item, doc)?
            .as_object()
            .ok_or_else(|| ParseError::SchemaError("parameter must be an object".into()))?;

        let name = param_obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ParseError::SchemaError("parameter missing 'name'".into()))?;

        let location_str = param_obj
            .get("in")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ParseError::SchemaError(format!("parameter '{}' missing 'in'", name))
            })?;

        let location = ParameterLocation::parse(location_str).ok_or_else(|| {
            ParseError::SchemaError(format!(
                "parameter '{}' has unknown location '{}'",
                name, location_str
            ))
        })?;

        let schema = match (format, location) {
            (SpecFormat::Swagger, ParameterLocation::Body) => param_obj.get("schema").cloned(),
            (SpecFormat::Swagger, _) => Some(swagger_param_schema(param_obj)),
            (SpecFormat::OpenApi, _) => param_obj.get("schema").cloned().or_else(|| {
                param_obj
                    .get("content")
                    .and_then(|c| c.as_object())
                    .and_then(|c| c.values().next())
                    .and_then(|m| m.get("schema").cloned())
            }),
        };

        params.push(Parameter {
            name: name.to_string(),
            location,
            required: param_obj
                .get("required")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            description: param_obj
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            schema,
        });
    }

    Ok(params)
}

/// Assemble a JSON Schema from a Swagger 2.0 non-body parameter's own fields.
fn swagger_param_schema(param: &Map<String, Value>) -> Value {
    Value::Object(
        SWAGGER_SCHEMA_FIELDS
            .iter()
            .filter_map(|key| param.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect(),
    )
}

/// Parse an OpenAPI 3.x `requestBody` into parameter declarations.
///
/// JSON-like bodies become one `body` parameter, named by `x-body-name` when
/// present. Form bodies spread their properties into `formData` parameters.
fn parse_request_body(
    obj: &Map<String, Value>,
    doc: &Value,
) -> Result<Option<(Vec<Parameter>, Vec<String>)>, ParseError> {
    let Some(body_value) = obj.get("requestBody") else {
        return Ok(None);
    };
    let body = deref(body_value, doc)?
        .as_object()
        .ok_or_else(|| ParseError::SchemaError("requestBody must be an object".into()))?;

    let required = body
        .get("required")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let Some(content) = body.get("content").and_then(|v| v.as_object()) else {
        return Ok(None);
    };

    let media_types: Vec<String> = content.keys().cloned().collect();

    let form_media = content
        .iter()
        .find(|(media, _)| FORM_MEDIA_TYPES.contains(&media.as_str()));
    let json_media = content.iter().find(|(media, _)| media.contains("json"));

    if let (Some((_, media_obj)), None) = (form_media, json_media) {
        let params = form_parameters(media_obj.get("schema"), doc)?;
        return Ok(Some((params, media_types)));
    }

    let schema = json_media
        .or_else(|| content.iter().next())
        .and_then(|(_, media_obj)| media_obj.get("schema").cloned());

    let name = body
        .get("x-body-name")
        .and_then(|v| v.as_str())
        .unwrap_or("body")
        .to_string();

    let param = Parameter {
        name,
        location: ParameterLocation::Body,
        required,
        description: body
            .get("description")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        schema,
    };

    Ok(Some((vec![param], media_types)))
}

/// Spread a form body schema's properties into `formData` parameters.
fn form_parameters(schema: Option<&Value>, doc: &Value) -> Result<Vec<Parameter>, ParseError> {
    let Some(schema) = schema else {
        return Ok(Vec::new());
    };
    let schema = deref(schema, doc)?;

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    let params = schema
        .get("properties")
        .and_then(|v| v.as_object())
        .map(|props| {
            props
                .iter()
                .map(|(name, prop_schema)| Parameter {
                    name: name.clone(),
                    location: ParameterLocation::FormData,
                    required: required.contains(&name.as_str()),
                    description: prop_schema
                        .get("description")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                    schema: Some(prop_schema.clone()),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(params)
}

/// Parse `responses` in declaration order.
fn parse_responses(
    obj: &Map<String, Value>,
    doc: &Value,
    format: SpecFormat,
) -> Result<Vec<ResponseDecl>, ParseError> {
    let Some(responses) = obj.get("responses").and_then(|v| v.as_object()) else {
        return Ok(Vec::new());
    };

    let mut decls = Vec::with_capacity(responses.len());
    for (status, response) in responses {
        let response = deref(response, doc)?;
        let schema = match format {
            SpecFormat::Swagger => response.get("schema").cloned(),
            SpecFormat::OpenApi => response
                .get("content")
                .and_then(|c| c.as_object())
                .and_then(|c| c.values().next())
                .and_then(|m| m.get("schema").cloned()),
        };

        decls.push(ResponseDecl {
            status: status.clone(),
            description: response
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            schema,
        });
    }

    Ok(decls)
}

/// OpenAPI 3.x response media types, deduplicated in first-seen order.
fn response_media_types(obj: &Map<String, Value>, doc: &Value) -> Result<Vec<String>, ParseError> {
    let mut media_types: Vec<String> = Vec::new();
    if let Some(responses) = obj.get("responses").and_then(|v| v.as_object()) {
        for response in responses.values() {
            let response = deref(response, doc)?;
            if let Some(content) = response.get("content").and_then(|c| c.as_object()) {
                for media in content.keys() {
                    if !media_types.contains(media) {
                        media_types.push(media.clone());
                    }
                }
            }
        }
    }
    Ok(media_types)
}
