//! Build the API config tree from raw nested input (JSON, YAML, file, or parsed value).
//! Defaults are applied and every node is validated in one pass; the first violation aborts the load.

use crate::config::types::*;
use crate::config::validator::{validate_authorization, validate_method, validate_output_format, validate_segment};
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const ROOT_KEYS: &[&str] = &["authorization", "version_in_url", "output_format", "versions"];
const AUTHORIZATION_KEYS: &[&str] = &["enabled", "secret"];
const VERSION_KEYS: &[&str] = &["endpoints"];
const ENDPOINT_KEYS: &[&str] = &[
    "endpoint",
    "repository",
    "methods",
    "allow_extra_fields",
    "allow_fields",
    "allow_get_all",
];

pub fn from_json_str(s: &str) -> Result<ApiConfig, ConfigError> {
    let raw: Value = serde_json::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
    build(&raw)
}

pub fn from_yaml_str(s: &str) -> Result<ApiConfig, ConfigError> {
    let raw: Value = serde_yaml::from_str(s).map_err(|e| ConfigError::Load(e.to_string()))?;
    build(&raw)
}

/// Load from a `.json`, `.yaml` or `.yml` file.
pub fn from_path(path: impl AsRef<Path>) -> Result<ApiConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loading api config");
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json_str(&content),
        Some("yaml") | Some("yml") => from_yaml_str(&content),
        other => Err(ConfigError::Load(format!(
            "unsupported config extension {:?} (expected json, yaml or yml)",
            other.unwrap_or("")
        ))),
    }
}

/// Build a validated config from a parsed tree. The tree may be wrapped in a
/// `search_api` key or be the bare root node.
pub fn build(raw: &Value) -> Result<ApiConfig, ConfigError> {
    let root = match raw {
        Value::Object(m) if m.len() == 1 && m.contains_key(ROOT_NODE) => &m[ROOT_NODE],
        other => other,
    };
    let empty = Map::new();
    let map = optional_map(ROOT_NODE, Some(root))?.unwrap_or(&empty);
    check_keys(ROOT_NODE, map, ROOT_KEYS)?;

    let authorization = build_authorization(map.get("authorization"))?;
    let version_in_url = bool_child(ROOT_NODE, map, "version_in_url", false)?;
    let output_format = match string_child(ROOT_NODE, map, "output_format")? {
        Some(s) => validate_output_format(&child_path(ROOT_NODE, "output_format"), &s)?,
        None => OutputFormat::default(),
    };
    let versions = build_versions(map.get("versions"))?;

    Ok(ApiConfig {
        authorization,
        version_in_url,
        output_format,
        versions,
    })
}

fn build_authorization(value: Option<&Value>) -> Result<AuthorizationConfig, ConfigError> {
    let path = child_path(ROOT_NODE, "authorization");
    let empty = Map::new();
    let map = optional_map(&path, value)?.unwrap_or(&empty);
    check_keys(&path, map, AUTHORIZATION_KEYS)?;
    let auth = AuthorizationConfig {
        enabled: bool_child(&path, map, "enabled", false)?,
        secret: string_child(&path, map, "secret")?,
    };
    validate_authorization(&path, &auth)?;
    Ok(auth)
}

fn build_versions(value: Option<&Value>) -> Result<VersionSet, ConfigError> {
    let path = child_path(ROOT_NODE, "versions");
    let mut versions = BTreeMap::new();
    for (label, node) in keyed_children(&path, value, "version")? {
        let version_path = child_path(&path, &label);
        validate_segment(&version_path, &label)?;
        check_keys(&version_path, &node, VERSION_KEYS)?;
        let endpoints = build_endpoints(&version_path, node.get("endpoints"))?;
        versions.insert(label, endpoints);
    }
    Ok(versions)
}

fn build_endpoints(version_path: &str, value: Option<&Value>) -> Result<Endpoints, ConfigError> {
    let path = child_path(version_path, "endpoints");
    let mut endpoints = BTreeMap::new();
    for (name, node) in keyed_children(&path, value, "endpoint")? {
        let endpoint_path = child_path(&path, &name);
        validate_segment(&endpoint_path, &name)?;
        let endpoint = build_endpoint(&endpoint_path, name.clone(), &node)?;
        endpoints.insert(name, endpoint);
    }
    Ok(endpoints)
}

fn build_endpoint(path: &str, name: String, map: &Map<String, Value>) -> Result<EndpointConfig, ConfigError> {
    check_keys(path, map, ENDPOINT_KEYS)?;
    // map key wins over an explicit `endpoint` child; the child only has to be a scalar
    string_child(path, map, "endpoint")?;

    let repository = string_child(path, map, "repository")?.ok_or_else(|| ConfigError::Required {
        path: path.to_string(),
        child: "repository".into(),
    })?;
    if repository.is_empty() {
        return Err(ConfigError::Invalid {
            path: child_path(path, "repository"),
            message: "The path cannot contain an empty value, but got \"\".".into(),
        });
    }

    let methods = match present(map.get("methods")) {
        Some(v) => {
            let methods_path = child_path(path, "methods");
            let mut set = BTreeSet::new();
            for (i, token) in string_list(&methods_path, v)?.into_iter().enumerate() {
                set.insert(validate_method(&child_path(&methods_path, &i.to_string()), &token)?);
            }
            set
        }
        None => EndpointConfig::default_methods(),
    };

    let allow_fields = match present(map.get("allow_fields")) {
        Some(v) => string_list(&child_path(path, "allow_fields"), v)?,
        None => Vec::new(),
    };

    Ok(EndpointConfig {
        name,
        repository,
        methods,
        allow_extra_fields: bool_child(path, map, "allow_extra_fields", false)?,
        allow_fields,
        allow_get_all: bool_child(path, map, "allow_get_all", false)?,
    })
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{}.{}", parent, key)
}

/// Explicit nulls are treated like absent keys.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn optional_map<'a>(path: &str, value: Option<&'a Value>) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match present(value) {
        None => Ok(None),
        Some(Value::Object(m)) => Ok(Some(m)),
        Some(other) => Err(ConfigError::InvalidType {
            path: path.to_string(),
            expected: "array",
            found: type_name_of_json(other),
        }),
    }
}

fn check_keys(path: &str, map: &Map<String, Value>, allowed: &[&str]) -> Result<(), ConfigError> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(k) => Err(ConfigError::Unrecognized {
            path: path.to_string(),
            option: k.clone(),
        }),
        None => Ok(()),
    }
}

fn bool_child(path: &str, map: &Map<String, Value>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match present(map.get(key)) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ConfigError::InvalidType {
            path: child_path(path, key),
            expected: "boolean",
            found: type_name_of_json(other),
        }),
    }
}

fn scalar_to_string(path: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::InvalidType {
            path: path.to_string(),
            expected: "scalar",
            found: type_name_of_json(other),
        }),
    }
}

fn string_child(path: &str, map: &Map<String, Value>, key: &str) -> Result<Option<String>, ConfigError> {
    present(map.get(key))
        .map(|v| scalar_to_string(&child_path(path, key), v))
        .transpose()
}

fn string_list(path: &str, value: &Value) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| scalar_to_string(&child_path(path, &i.to_string()), v))
            .collect(),
        other => Err(ConfigError::InvalidType {
            path: path.to_string(),
            expected: "array",
            found: type_name_of_json(other),
        }),
    }
}

/// Children of a keyed collection: either a map keyed by name, or a list whose entries carry
/// the key as `attribute` (removed from the returned node).
fn keyed_children(
    path: &str,
    value: Option<&Value>,
    attribute: &str,
) -> Result<Vec<(String, Map<String, Value>)>, ConfigError> {
    let mut out: Vec<(String, Map<String, Value>)> = Vec::new();
    match present(value) {
        None => {}
        Some(Value::Object(m)) => {
            for (key, child) in m {
                let node_path = child_path(path, key);
                let node = optional_map(&node_path, Some(child))?.cloned().unwrap_or_default();
                out.push((key.clone(), node));
            }
        }
        Some(Value::Array(items)) => {
            for (i, child) in items.iter().enumerate() {
                let item_path = child_path(path, &i.to_string());
                let mut node = optional_map(&item_path, Some(child))?.cloned().unwrap_or_default();
                let key = match present(node.remove(attribute).as_ref()) {
                    Some(v) => scalar_to_string(&child_path(&item_path, attribute), v)?,
                    None => {
                        return Err(ConfigError::Required {
                            path: item_path,
                            child: attribute.to_string(),
                        })
                    }
                };
                if out.iter().any(|(k, _)| *k == key) {
                    return Err(ConfigError::Duplicate {
                        path: path.to_string(),
                        key,
                    });
                }
                out.push((key, node));
            }
        }
        Some(other) => {
            return Err(ConfigError::InvalidType {
                path: path.to_string(),
                expected: "array",
                found: type_name_of_json(other),
            })
        }
    }
    Ok(out)
}
