//! Typed API configuration tree: authorization, output format and versioned endpoints.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the root node; error paths start with it.
pub const ROOT_NODE: &str = "search_api";

/// HTTP verbs an endpoint may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Head,
    Post,
    Patch,
    Get,
    Put,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 6] = [
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Patch,
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Map a request method; `None` for verbs endpoints cannot be configured with.
    pub fn from_http(method: &axum::http::Method) -> Option<Self> {
        method.as_str().parse().ok()
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    /// Exact, upper-case match only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Xml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Xml => "xml",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "xml" => Ok(OutputFormat::Xml),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizationConfig {
    /// Set to true if authorization needs to be enabled.
    pub enabled: bool,
    /// Secret used for authentication. Required when `enabled`.
    pub secret: Option<String>,
}

/// One exposed document collection inside a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointConfig {
    /// Endpoint name, used as the URL segment (e.g. `products`).
    pub name: String,
    /// Identifier of the repository binding used for data access (e.g. `es.manager.default.products`).
    pub repository: String,
    pub methods: BTreeSet<HttpMethod>,
    /// Accept body fields outside `allow_fields`.
    pub allow_extra_fields: bool,
    /// Fields that may be written through the API. Empty means no restriction.
    pub allow_fields: Vec<String>,
    /// Allow fetching every document of the collection in one request.
    pub allow_get_all: bool,
}

impl EndpointConfig {
    pub fn default_methods() -> BTreeSet<HttpMethod> {
        [HttpMethod::Post, HttpMethod::Get].into_iter().collect()
    }

    /// Endpoint with all optional settings at their defaults.
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        EndpointConfig {
            name: name.into(),
            repository: repository.into(),
            methods: Self::default_methods(),
            allow_extra_fields: false,
            allow_fields: Vec::new(),
            allow_get_all: false,
        }
    }
}

/// Endpoints of one version, keyed by endpoint name.
pub type Endpoints = BTreeMap<String, EndpointConfig>;

/// Version label -> endpoints.
pub type VersionSet = BTreeMap<String, Endpoints>;

/// Root of the validated configuration. Immutable once built.
///
/// Built only by the loader ([`build`](crate::config::build) and friends), which applies
/// defaults and every schema rule. There is no `Deserialize` impl.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApiConfig {
    pub authorization: AuthorizationConfig,
    /// By default the version is only taken from the Accept header; when set it is also a URL prefix.
    pub version_in_url: bool,
    /// Default encoding; can be changed per request through the Accept header.
    pub output_format: OutputFormat,
    pub versions: VersionSet,
}

/// Name of a JSON node type, for error messages.
pub(crate) fn type_name_of_json(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
