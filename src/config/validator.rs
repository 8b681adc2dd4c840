//! Config validation: per-node rules and cross-field checks.

use crate::config::{ApiConfig, AuthorizationConfig, HttpMethod, OutputFormat};
use crate::error::ConfigError;
use regex::Regex;
use std::sync::OnceLock;

pub const SECRET_REQUIRED: &str = "'secret' for api must be set if authorization is enabled.";
pub const INVALID_OUTPUT_FORMAT: &str =
    "Currently valid encoders are only json and xml. For more you can inject your own serializer.";
pub const INVALID_METHOD: &str =
    "Invalid HTTP method used! Please check your search_api endpoint configuration.";

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.~-]+$").expect("valid regex"))
}

pub fn validate_authorization(path: &str, auth: &AuthorizationConfig) -> Result<(), ConfigError> {
    let has_secret = auth.secret.as_deref().is_some_and(|s| !s.is_empty());
    if auth.enabled && !has_secret {
        return Err(ConfigError::Invalid {
            path: path.to_string(),
            message: SECRET_REQUIRED.into(),
        });
    }
    Ok(())
}

pub fn validate_output_format(path: &str, value: &str) -> Result<OutputFormat, ConfigError> {
    value.parse().map_err(|v: String| ConfigError::Invalid {
        path: path.to_string(),
        message: format!("\"{}\": {}", v, INVALID_OUTPUT_FORMAT),
    })
}

pub fn validate_method(path: &str, value: &str) -> Result<HttpMethod, ConfigError> {
    value.parse().map_err(|v: String| ConfigError::Invalid {
        path: path.to_string(),
        message: format!("\"{}\": {}", v, INVALID_METHOD),
    })
}

/// Version labels and endpoint names become URL segments.
pub fn validate_segment(path: &str, key: &str) -> Result<(), ConfigError> {
    if !segment_re().is_match(key) {
        return Err(ConfigError::Invalid {
            path: path.to_string(),
            message: format!("\"{}\" is not a valid URL path segment", key),
        });
    }
    Ok(())
}

/// Re-check a tree that may have been built in code rather than loaded.
pub fn validate(config: &ApiConfig) -> Result<(), ConfigError> {
    let root = super::ROOT_NODE;
    validate_authorization(&format!("{}.authorization", root), &config.authorization)?;
    for (version, endpoints) in &config.versions {
        let version_path = format!("{}.versions.{}", root, version);
        validate_segment(&version_path, version)?;
        for (name, endpoint) in endpoints {
            let endpoint_path = format!("{}.endpoints.{}", version_path, name);
            validate_segment(&endpoint_path, name)?;
            if endpoint.repository.is_empty() {
                return Err(ConfigError::Required {
                    path: endpoint_path,
                    child: "repository".into(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;

    #[test]
    fn enabled_authorization_needs_non_empty_secret() {
        let mut auth = AuthorizationConfig {
            enabled: true,
            secret: Some(String::new()),
        };
        assert!(validate_authorization("search_api.authorization", &auth).is_err());
        auth.secret = Some("s3cr3t".into());
        assert!(validate_authorization("search_api.authorization", &auth).is_ok());
        auth.enabled = false;
        auth.secret = None;
        assert!(validate_authorization("search_api.authorization", &auth).is_ok());
    }

    #[test]
    fn segments_reject_slashes_and_route_syntax() {
        assert!(validate_segment("p", "v1").is_ok());
        assert!(validate_segment("p", "my-products_2").is_ok());
        assert!(validate_segment("p", "a/b").is_err());
        assert!(validate_segment("p", ":id").is_err());
        assert!(validate_segment("p", "").is_err());
    }

    #[test]
    fn validate_flags_empty_repository_in_code_built_tree() {
        let mut config = ApiConfig::default();
        let mut endpoints = crate::config::Endpoints::new();
        endpoints.insert("products".into(), EndpointConfig::new("products", ""));
        config.versions.insert("v1".into(), endpoints);
        let err = validate(&config).unwrap_err();
        assert_eq!(err.path(), Some("search_api.versions.v1.endpoints.products"));
    }
}
