//! Typed errors and HTTP mapping.

use crate::config::OutputFormat;
use crate::response::{error_body, render_value};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Startup failures: schema violations in the API tree or unresolved bindings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing reference: {kind} id '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("The child node \"{child}\" at path \"{path}\" must be configured.")]
    Required { path: String, child: String },
    #[error("Unrecognized option \"{option}\" under \"{path}\"")]
    Unrecognized { path: String, option: String },
    #[error("Invalid type for path \"{path}\". Expected {expected}, but got {found}.")]
    InvalidType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid configuration for path \"{path}\": {message}")]
    Invalid { path: String, message: String },
    #[error("duplicate key \"{key}\" under \"{path}\"")]
    Duplicate { path: String, key: String },
    #[error("config load: {0}")]
    Load(String),
}

impl ConfigError {
    /// Path of the offending node, when the error is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConfigError::Required { path, .. }
            | ConfigError::Unrecognized { path, .. }
            | ConfigError::InvalidType { path, .. }
            | ConfigError::Invalid { path, .. }
            | ConfigError::Duplicate { path, .. } => Some(path),
            ConfigError::MissingReference { .. } | ConfigError::Load(_) => None,
        }
    }
}

/// Failures reported by a document repository. The dispatcher classifies these per verb.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("no rows returned".into()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    MethodNotAllowed(String),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::MethodNotAllowed(_) => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            AppError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type")
            }
            AppError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "repository_error"),
        }
    }

    /// Render the error body in the negotiated output format.
    pub fn render(self, format: OutputFormat) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), code, message = %self, "request failed");
        } else {
            tracing::error!(status = status.as_u16(), code, message = %self, "request failed");
        }
        let body = error_body(code, self.to_string(), None);
        render_value(format, status, Some(&body))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(OutputFormat::Json)
    }
}
