//! Compiled route model.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use embrasure_interceptor::Interceptor;
use embrasure_schema::Schema;

use crate::context::Context;

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Trace,
}

impl Method {
    /// Parse a method name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "head" => Some(Self::Head),
            "options" => Some(Self::Options),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter goes in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Path,
    Query,
    Body,
    Form,
    Header,
}

impl Placement {
    pub const ALL: [Placement; 5] = [
        Placement::Path,
        Placement::Query,
        Placement::Body,
        Placement::Form,
        Placement::Header,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Body => "body",
            Self::Form => "form",
            Self::Header => "header",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of a path template.
///
/// In a route table a literal is a plain string and a parameter is
/// `{param: name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathToken {
    Literal(String),
    Param { param: String },
}

impl PathToken {
    pub fn literal(s: impl Into<String>) -> Self {
        PathToken::Literal(s.into())
    }

    pub fn param(name: impl Into<String>) -> Self {
        PathToken::Param { param: name.into() }
    }
}

/// An ordered sequence of literal and parameter tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTemplate {
    tokens: Vec<PathToken>,
}

impl PathTemplate {
    pub fn from_tokens(tokens: Vec<PathToken>) -> Self {
        let mut template = PathTemplate { tokens: Vec::new() };
        for token in tokens {
            template.push(token);
        }
        template
    }

    /// Adjacent literals are merged so equal templates compare equal.
    fn push(&mut self, token: PathToken) {
        if let PathToken::Literal(s) = &token {
            if s.is_empty() {
                return;
            }
            if let Some(PathToken::Literal(prev)) = self.tokens.last_mut() {
                prev.push_str(s);
                return;
            }
        }
        self.tokens.push(token);
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Parameter names in template order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            PathToken::Param { param } => Some(param.as_str()),
            PathToken::Literal(_) => None,
        })
    }

    /// A copy of this template with `prefix` prepended as a literal.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.push(PathToken::literal(prefix));
        tokens.extend(self.tokens.iter().cloned());
        Self::from_tokens(tokens)
    }
}

/// Renders parameters back as `{name}`.
impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                PathToken::Literal(s) => f.write_str(s)?,
                PathToken::Param { param } => write!(f, "{{{}}}", param)?,
            }
        }
        Ok(())
    }
}

/// Which response statuses a declared response covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatcher {
    /// A single status code.
    Exact(u16),
    /// A status class: `Range(4)` is `4XX`.
    Range(u8),
    /// `default`: any status.
    Any,
}

impl StatusMatcher {
    pub fn parse(s: &str) -> Option<Self> {
        if s == "default" {
            return Some(Self::Any);
        }
        if let [class @ b'1'..=b'5', b'X' | b'x', b'X' | b'x'] = s.as_bytes() {
            return Some(Self::Range(class - b'0'));
        }
        s.parse::<u16>()
            .ok()
            .filter(|code| (100..600).contains(code))
            .map(Self::Exact)
    }

    pub fn matches(&self, status: u16) -> bool {
        match self {
            Self::Exact(code) => *code == status,
            Self::Range(class) => status / 100 == u16::from(*class),
            Self::Any => true,
        }
    }
}

impl fmt::Display for StatusMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(code) => write!(f, "{}", code),
            Self::Range(class) => write!(f, "{}XX", class),
            Self::Any => f.write_str("default"),
        }
    }
}

impl Serialize for StatusMatcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A declared response and its body schema.
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub status: StatusMatcher,
    pub description: Option<String>,
    pub body: Option<Schema>,
}

/// The single body parameter of a route.
#[derive(Debug, Clone)]
pub struct BodySchema {
    /// Name as declared.
    pub name: String,
    /// Normalized name, used for the nested-body convention.
    pub key: String,
    pub required: bool,
    pub schema: Schema,
}

/// One optional schema per placement.
#[derive(Debug, Clone, Default)]
pub struct PlacementSchemas {
    pub path: Option<Schema>,
    pub query: Option<Schema>,
    pub body: Option<BodySchema>,
    pub form: Option<Schema>,
    pub header: Option<Schema>,
}

impl PlacementSchemas {
    pub fn get(&self, placement: Placement) -> Option<&Schema> {
        match placement {
            Placement::Path => self.path.as_ref(),
            Placement::Query => self.query.as_ref(),
            Placement::Body => self.body.as_ref().map(|b| &b.schema),
            Placement::Form => self.form.as_ref(),
            Placement::Header => self.header.as_ref(),
        }
    }

    /// Placements that have a schema, in canonical order.
    pub fn present(&self) -> Vec<Placement> {
        Placement::ALL
            .into_iter()
            .filter(|p| self.get(*p).is_some())
            .collect()
    }
}

/// A compiled API operation.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    /// Lowercase-hyphenated identifier, unique within a registry.
    pub route_name: String,
    pub method: Method,
    pub path_template: PathTemplate,
    pub schemas: PlacementSchemas,
    pub response_schemas: Vec<ResponseSchema>,
    /// The source fragment this route was compiled from.
    pub raw_definition: Value,
    /// Appended after the registry chain when building this route.
    pub interceptors: Vec<Interceptor<Context>>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
}

impl RouteDescriptor {
    /// The first declared response covering `status`.
    ///
    /// Exact codes are preferred over ranges, and ranges over `default`.
    pub fn response_for(&self, status: u16) -> Option<&ResponseSchema> {
        let rank = |m: &StatusMatcher| match m {
            StatusMatcher::Exact(_) => 0,
            StatusMatcher::Range(_) => 1,
            StatusMatcher::Any => 2,
        };
        self.response_schemas
            .iter()
            .filter(|r| r.status.matches(status))
            .min_by_key(|r| rank(&r.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_ignores_case() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("patch"), Some(Method::Patch));
        assert_eq!(Method::parse("connect"), None);
        assert_eq!(serde_json::to_value(Method::Post).unwrap(), "post");
    }

    #[test]
    fn template_merges_adjacent_literals() {
        let template = PathTemplate::from_tokens(vec![
            PathToken::literal("/v1"),
            PathToken::literal("/pets/"),
            PathToken::param("id"),
            PathToken::literal(""),
        ]);
        assert_eq!(
            template.tokens(),
            &[PathToken::literal("/v1/pets/"), PathToken::param("id")]
        );
        assert_eq!(template.to_string(), "/v1/pets/{id}");
        assert_eq!(template.params().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn template_prefix() {
        let template = PathTemplate::from_tokens(vec![PathToken::literal("/pets")]);
        assert_eq!(template.with_prefix("/api").to_string(), "/api/pets");
        assert_eq!(template.with_prefix("").to_string(), "/pets");
    }

    #[test]
    fn path_tokens_deserialize_from_route_tables() {
        let tokens: Vec<PathToken> =
            serde_json::from_value(serde_json::json!(["/pets/", {"param": "id"}])).unwrap();
        assert_eq!(tokens, vec![PathToken::literal("/pets/"), PathToken::param("id")]);
    }

    #[test]
    fn status_matchers() {
        assert_eq!(StatusMatcher::parse("200"), Some(StatusMatcher::Exact(200)));
        assert_eq!(StatusMatcher::parse("4XX"), Some(StatusMatcher::Range(4)));
        assert_eq!(StatusMatcher::parse("default"), Some(StatusMatcher::Any));
        assert_eq!(StatusMatcher::parse("ok"), None);
        assert_eq!(StatusMatcher::parse("999"), None);

        assert!(StatusMatcher::Range(4).matches(404));
        assert!(!StatusMatcher::Range(4).matches(500));
        assert!(StatusMatcher::Any.matches(204));
        assert_eq!(StatusMatcher::Range(5).to_string(), "5XX");
        assert_eq!(
            serde_json::to_value(StatusMatcher::Exact(201)).unwrap(),
            "201"
        );
    }

    #[test]
    fn placement_order_and_names() {
        assert_eq!(Placement::Header.to_string(), "header");
        assert!(Placement::Path < Placement::Header);
        assert!(PlacementSchemas::default().present().is_empty());
    }
}
