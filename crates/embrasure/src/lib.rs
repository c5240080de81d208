//! Embrasure client library.
//!
//! Compiles Swagger 2.0 / OpenAPI 3.x descriptions (or hand-written route
//! tables) into named routes, then builds fully-formed HTTP request
//! descriptors for those routes by running an interceptor chain over the
//! caller's parameters. Performing the request is left to the caller.
//!
//! ```ignore
//! use embrasure::Registry;
//! use serde_json::json;
//!
//! let registry = Registry::from_spec_file("petstore.yaml".as_ref(), Some("https://api.test"))?;
//! let request = registry.request_for("get-pet", &json!({"id": 123}))?;
//! // Some({"method": "get", "url": "https://api.test/pets/123"})
//! ```

pub mod compiler;
pub mod context;
pub mod error;
pub mod interceptors;
pub mod registry;
pub mod route;

pub use compiler::{compile, compile_routes, parse_route_table, CompileOptions, RouteDefinition};
pub use context::{Context, PathBuilder, Request, RequestDescriptor, BODY_KEY};
pub use error::{BuildError, CompileError};
pub use interceptors::default_interceptors;
pub use registry::{Registry, RegistryBuilder, RouteSummary};
pub use route::{
    BodySchema, Method, PathTemplate, PathToken, Placement, PlacementSchemas, ResponseSchema,
    RouteDescriptor, StatusMatcher,
};

pub use embrasure_interceptor::{chain, execute, Interceptor, PipelineContext, Position};
pub use embrasure_schema::{normalize_key, Schema};
pub use embrasure_spec_parser::{parse_spec, parse_spec_file, ApiSpec};
