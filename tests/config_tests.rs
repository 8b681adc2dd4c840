//! Tests for loading and validating the API config tree
//!
//! These tests verify that:
//! - Defaults are applied for every optional node
//! - Cross-field and enum rules reject bad input with the offending path
//! - Repository bindings are checked when the app state is built

use search_api::config::{HttpMethod, OutputFormat, INVALID_METHOD, INVALID_OUTPUT_FORMAT, SECRET_REQUIRED};
use search_api::{build, from_json_str, from_yaml_str, AppState, ConfigError, MemoryRepository, RepositoryRegistry};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Defaults
// =============================================================================

mod defaults {
    use super::*;

    #[test]
    fn endpoint_defaults_are_applied() {
        let config = from_yaml_str(
            r#"
search_api:
  versions:
    v1:
      endpoints:
        products:
          repository: es.manager.default.products
"#,
        )
        .unwrap();

        assert!(!config.authorization.enabled);
        assert_eq!(config.authorization.secret, None);
        assert!(!config.version_in_url);
        assert_eq!(config.output_format, OutputFormat::Json);

        let products = &config.versions["v1"]["products"];
        assert_eq!(products.name, "products");
        assert_eq!(products.repository, "es.manager.default.products");
        assert_eq!(
            products.methods.iter().copied().collect::<Vec<_>>(),
            vec![HttpMethod::Post, HttpMethod::Get]
        );
        assert!(!products.allow_extra_fields);
        assert!(products.allow_fields.is_empty());
        assert!(!products.allow_get_all);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = from_json_str(
            &json!({
                "authorization": { "enabled": true, "secret": "s3cr3t" },
                "version_in_url": true,
                "output_format": "xml",
                "versions": {
                    "v2": {
                        "endpoints": {
                            "people": {
                                "repository": "people",
                                "methods": ["HEAD", "DELETE", "DELETE"],
                                "allow_extra_fields": true,
                                "allow_fields": ["name", "surname"],
                                "allow_get_all": true
                            }
                        }
                    }
                }
            })
            .to_string(),
        )
        .unwrap();

        assert!(config.authorization.enabled);
        assert!(config.version_in_url);
        assert_eq!(config.output_format, OutputFormat::Xml);
        let people = &config.versions["v2"]["people"];
        assert_eq!(people.methods.len(), 2);
        assert!(people.allows(HttpMethod::Head));
        assert!(!people.allows(HttpMethod::Get));
        assert_eq!(people.allow_fields, vec!["name", "surname"]);
        assert!(people.allow_get_all);
    }

    #[test]
    fn sparse_tree_gets_every_default() {
        let config = build(&json!({ "versions": {} })).unwrap();
        assert_eq!(config, search_api::ApiConfig::default());
    }

    #[test]
    fn empty_methods_list_disables_every_verb() {
        let config = build(&json!({
            "versions": { "v1": { "endpoints": { "p": { "repository": "r", "methods": [] } } } }
        }))
        .unwrap();
        assert!(config.versions["v1"]["p"].methods.is_empty());
    }
}

// =============================================================================
// Rule violations
// =============================================================================

mod violations {
    use super::*;

    #[test]
    fn enabled_authorization_without_secret_fails() {
        for auth in [json!({ "enabled": true }), json!({ "enabled": true, "secret": "" }), json!({ "enabled": true, "secret": null })] {
            let err = build(&json!({ "authorization": auth })).unwrap_err();
            assert_eq!(err.path(), Some("search_api.authorization"));
            assert!(err.to_string().contains(SECRET_REQUIRED), "{}", err);
        }
    }

    #[test]
    fn unknown_output_formats_fail() {
        for format in ["yaml", "JSON", "csv", ""] {
            let err = build(&json!({ "output_format": format })).unwrap_err();
            assert_eq!(err.path(), Some("search_api.output_format"));
            assert!(err.to_string().contains(INVALID_OUTPUT_FORMAT), "{}", err);
        }
    }

    #[test]
    fn unknown_methods_fail() {
        for method in ["OPTIONS", "get", "TRACE", "FETCH"] {
            let err = build(&json!({
                "versions": { "v1": { "endpoints": { "p": { "repository": "r", "methods": ["GET", method] } } } }
            }))
            .unwrap_err();
            assert_eq!(err.path(), Some("search_api.versions.v1.endpoints.p.methods.1"));
            assert!(err.to_string().contains(INVALID_METHOD), "{}", err);
        }
    }

    #[test]
    fn missing_repository_is_a_required_field_violation() {
        let err = build(&json!({
            "versions": { "v1": { "endpoints": { "products": { "allow_get_all": true } } } }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Required {
                path: "search_api.versions.v1.endpoints.products".into(),
                child: "repository".into()
            }
        );
        assert_eq!(
            err.to_string(),
            "The child node \"repository\" at path \"search_api.versions.v1.endpoints.products\" must be configured."
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = build(&json!({ "authorization": { "enabled": false, "token": "x" } })).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Unrecognized {
                path: "search_api.authorization".into(),
                option: "token".into()
            }
        );
    }

    #[test]
    fn wrong_types_name_expected_type() {
        let err = build(&json!({ "version_in_url": "yes" })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for path \"search_api.version_in_url\". Expected boolean, but got string."
        );
    }

    #[test]
    fn labels_must_be_path_segments() {
        let err = build(&json!({ "versions": { "v 1": {} } })).unwrap_err();
        assert_eq!(err.path(), Some("search_api.versions.v 1"));
    }

    #[test]
    fn loose_trees_are_never_accepted_as_is() {
        let tree = json!({
            "authorization": { "enabled": true, "secret": null },
            "versions": { "v1": { "endpoints": { "p": { "repository": "" } } } }
        });
        let err = build(&tree).unwrap_err();
        assert_eq!(err.path(), Some("search_api.authorization"));

        let tree = json!({ "versions": { "v1": { "endpoints": { "p": { "repository": "" } } } } });
        let err = build(&tree).unwrap_err();
        assert_eq!(err.path(), Some("search_api.versions.v1.endpoints.p.repository"));
    }

    #[test]
    fn malformed_input_is_a_load_error() {
        assert!(matches!(from_json_str("{"), Err(ConfigError::Load(_))));
        assert!(matches!(from_yaml_str("a: [1"), Err(ConfigError::Load(_))));
    }
}

// =============================================================================
// Repository bindings
// =============================================================================

mod bindings {
    use super::*;

    fn config() -> search_api::ApiConfig {
        build(&json!({
            "versions": { "v1": { "endpoints": {
                "people": { "repository": "people" },
                "products": { "repository": "products" }
            } } }
        }))
        .unwrap()
    }

    #[test]
    fn unbound_repository_fails_startup() {
        let registry = RepositoryRegistry::new().with("people", Arc::new(MemoryRepository::new()));
        let err = AppState::new(config(), registry).err().unwrap();
        assert_eq!(
            err,
            ConfigError::MissingReference {
                kind: "repository",
                id: "products".into()
            }
        );
    }

    #[test]
    fn fully_bound_config_builds_state() {
        let registry = RepositoryRegistry::new()
            .with("people", Arc::new(MemoryRepository::new()))
            .with("products", Arc::new(MemoryRepository::new()));
        assert!(AppState::new(config(), registry).is_ok());
    }
}
