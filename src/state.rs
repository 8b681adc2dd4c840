//! Shared application state for all routes. Built once at startup; never mutated afterwards.

use crate::config::{validate, ApiConfig};
use crate::error::ConfigError;
use crate::store::RepositoryRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub repositories: Arc<RepositoryRegistry>,
}

impl AppState {
    /// Validate the config and check that every endpoint's repository is bound.
    pub fn new(config: ApiConfig, repositories: RepositoryRegistry) -> Result<Self, ConfigError> {
        validate(&config)?;
        if let Some(missing) = config.repository_ids().into_iter().find(|id| !repositories.contains(id)) {
            return Err(ConfigError::MissingReference {
                kind: "repository",
                id: missing.to_string(),
            });
        }
        tracing::info!(
            versions = config.versions.len(),
            repositories = config.repository_ids().len(),
            output_format = config.output_format.as_str(),
            "api config loaded"
        );
        Ok(AppState {
            config: Arc::new(config),
            repositories: Arc::new(repositories),
        })
    }
}
