//! The default request-building chain.
//!
//! `request-building-handler` comes first so that its leave hook runs last,
//! after every other interceptor has had its say. The remaining defaults are
//! enter-only and fill one part of the request each.

use serde_json::{Map, Value};

use embrasure_interceptor::Interceptor;
use embrasure_schema::{normalize_key, CoercionError};
use embrasure_telemetry::log_pipeline_short_circuit;

use crate::context::{coerce, Context, BODY_KEY};
use crate::error::BuildError;
use crate::route::{BodySchema, Placement};

/// Names of the default interceptors, for use with
/// [`embrasure_interceptor::inject`] and [`embrasure_interceptor::remove`].
pub mod names {
    pub const REQUEST_BUILDING_HANDLER: &str = "request-building-handler";
    pub const METHOD: &str = "method";
    pub const URL: &str = "url";
    pub const QUERY_PARAMS: &str = "query-params";
    pub const BODY_PARAMS: &str = "body-params";
    pub const FORM_PARAMS: &str = "form-params";
    pub const HEADER_PARAMS: &str = "header-params";
}

/// A fresh copy of the default chain.
pub fn default_interceptors() -> Vec<Interceptor<Context>> {
    vec![
        request_building_handler(),
        method(),
        url(),
        query_params(),
        body_params(),
        form_params(),
        header_params(),
    ]
}

/// Sets `request.method` from the route.
pub fn method() -> Interceptor<Context> {
    Interceptor::enter(names::METHOD, |ctx: &mut Context| {
        ctx.request.method = Some(ctx.handler().method);
        Ok(())
    })
}

/// Renders `request.url` from the path parameters.
pub fn url() -> Interceptor<Context> {
    Interceptor::enter(names::URL, |ctx: &mut Context| {
        let url = ctx
            .path_builder()
            .render(ctx.handler(), &ctx.request.params)?;
        ctx.request.url = Some(url);
        Ok(())
    })
}

/// Sets `request.query_params` when the route declares query parameters
/// and any are supplied.
pub fn query_params() -> Interceptor<Context> {
    Interceptor::enter(names::QUERY_PARAMS, |ctx: &mut Context| {
        let query = ctx.coerce_params(Placement::Query)?;
        if query.is_some() {
            ctx.request.query_params = query;
        }
        Ok(())
    })
}

/// Sets `request.body`.
///
/// The body is taken from the params under [`BODY_KEY`], else nested under
/// the body parameter's name, else from the params themselves when they
/// contain any of the body's properties.
pub fn body_params() -> Interceptor<Context> {
    Interceptor::enter(names::BODY_PARAMS, |ctx: &mut Context| {
        let body = build_body(ctx)?;
        if body.is_some() {
            ctx.request.body = body;
        }
        Ok(())
    })
}

/// Sets `request.form_params`.
pub fn form_params() -> Interceptor<Context> {
    Interceptor::enter(names::FORM_PARAMS, |ctx: &mut Context| {
        let form = ctx.coerce_params(Placement::Form)?;
        if form.is_some() {
            ctx.request.form_params = form;
        }
        Ok(())
    })
}

/// Sets `request.headers`, keyed by header names as declared.
pub fn header_params() -> Interceptor<Context> {
    Interceptor::enter(names::HEADER_PARAMS, |ctx: &mut Context| {
        let headers = ctx.coerce_params(Placement::Header)?;
        if headers.is_some() {
            ctx.request.headers = headers;
        }
        Ok(())
    })
}

/// Turns the accumulated request into the response unless something else
/// already produced one, or the build is failing.
pub fn request_building_handler() -> Interceptor<Context> {
    Interceptor::leave(names::REQUEST_BUILDING_HANDLER, |ctx: &mut Context| {
        if ctx.error().is_some() {
            return Ok(());
        }
        if ctx.response.is_some() {
            log_pipeline_short_circuit!(
                route = %ctx.handler().route_name,
                "response provided by interceptor"
            );
            return Ok(());
        }
        let descriptor = ctx.request.to_descriptor(&ctx.handler().route_name)?;
        ctx.response = Some(descriptor);
        Ok(())
    })
}

fn build_body(ctx: &Context) -> Result<Option<Value>, BuildError> {
    let route = ctx.handler();
    let Some(body) = &route.schemas.body else {
        return Ok(None);
    };
    let params = ctx.request.params.as_object();

    let data = match params.and_then(|p| supplied_body(body, p)) {
        Some(data) => data,
        None if !body.required => return Ok(None),
        // Let the schema report which of its keys are missing.
        None if !body.schema.keys().is_empty() => Value::Object(Map::new()),
        None => {
            return Err(BuildError::Coercion {
                route: route.route_name.clone(),
                placement: Placement::Body,
                source: CoercionError::MissingKeys {
                    keys: vec![body.key.clone()],
                },
            })
        }
    };

    let coerced = coerce(route, Placement::Body, &body.schema, &data)?;
    match &coerced {
        Value::Object(map) if map.is_empty() => Ok(None),
        _ => Ok(Some(coerced)),
    }
}

fn supplied_body(body: &BodySchema, params: &Map<String, Value>) -> Option<Value> {
    if let Some(value) = params.get(BODY_KEY).filter(|v| !v.is_null()) {
        return Some(value.clone());
    }

    let nested = params
        .get(&body.key)
        .or_else(|| params.get(&body.name))
        .or_else(|| {
            params
                .iter()
                .find(|(k, _)| normalize_key(k) == body.key)
                .map(|(_, v)| v)
        })
        .filter(|v| !v.is_null());
    if let Some(value) = nested {
        if !body.schema.declares(&body.key) {
            return Some(value.clone());
        }
    }

    if params.keys().any(|k| body.schema.declares(k)) {
        return Some(Value::Object(params.clone()));
    }
    None
}
