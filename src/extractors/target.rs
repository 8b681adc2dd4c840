//! Resolve the endpoint, version and repository a request is aimed at.

use crate::config::{EndpointConfig, EndpointKey, HttpMethod, OutputFormat};
use crate::error::{AppError, ConfigError};
use crate::extractors::negotiation::{negotiate_format, requested_version};
use crate::service::CrudService;
use crate::state::AppState;
use crate::store::DocumentRepository;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Response,
};
use std::sync::Arc;

/// Everything a CRUD handler needs about the request target.
#[derive(Clone)]
pub struct Target {
    pub version: String,
    pub endpoint: EndpointConfig,
    pub method: HttpMethod,
    pub format: OutputFormat,
    pub repository: Arc<dyn DocumentRepository>,
}

impl Target {
    pub fn crud(&self) -> CrudService {
        CrudService::new(self.repository.clone())
    }

    fn resolve(parts: &Parts, state: &AppState) -> Result<Self, AppError> {
        let key = parts
            .extensions
            .get::<EndpointKey>()
            .ok_or_else(|| AppError::NotFound("no endpoint bound to this route".into()))?;
        let requested = match &key.version {
            Some(v) => Some(v.clone()),
            None => requested_version(&parts.headers),
        };
        let version = state
            .config
            .resolve_version(requested.as_deref())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "api version '{}' is not configured",
                    requested.as_deref().unwrap_or_default()
                ))
            })?
            .to_string();
        let endpoint = state
            .config
            .endpoint(&version, &key.endpoint)
            .ok_or_else(|| {
                AppError::NotFound(format!("endpoint '{}' is not available in version '{}'", key.endpoint, version))
            })?
            .clone();

        let method = HttpMethod::from_http(&parts.method)
            .filter(|m| endpoint.allows(*m))
            .ok_or_else(|| {
                AppError::MethodNotAllowed(format!(
                    "method {} is not allowed for endpoint '{}'",
                    parts.method, endpoint.name
                ))
            })?;

        let repository = state
            .repositories
            .get(&endpoint.repository)
            .cloned()
            .ok_or_else(|| ConfigError::MissingReference {
                kind: "repository",
                id: endpoint.repository.clone(),
            })?;

        Ok(Target {
            version,
            endpoint,
            method,
            format: negotiate_format(&parts.headers, state.config.output_format),
            repository,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Target {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Target::resolve(parts, state).map_err(|e| {
            let format = negotiate_format(&parts.headers, state.config.output_format);
            e.render(format)
        })
    }
}
