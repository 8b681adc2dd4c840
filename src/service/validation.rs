//! Request body checks from endpoint config.

use crate::config::EndpointConfig;
use crate::error::AppError;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Parse a request body into a JSON object.
    pub fn parse_body(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(m)) => Ok(m),
            Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
            Err(e) => Err(AppError::BadRequest(format!("invalid JSON body: {}", e))),
        }
    }

    /// Reject fields the endpoint does not allow to be written.
    pub fn validate(body: &Map<String, Value>, endpoint: &EndpointConfig) -> Result<(), AppError> {
        let rejected: Vec<&str> = body
            .keys()
            .map(String::as_str)
            .filter(|k| !endpoint.accepts_field(k))
            .collect();
        if rejected.is_empty() {
            return Ok(());
        }
        Err(AppError::Validation(format!(
            "fields not allowed for endpoint '{}': {}",
            endpoint.name,
            rejected.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_is_empty_object() {
        assert!(RequestValidator::parse_body(b"  ").unwrap().is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(RequestValidator::parse_body(b"[1]"), Err(AppError::BadRequest(_))));
        assert!(matches!(RequestValidator::parse_body(b"{"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn lists_rejected_fields() {
        let mut endpoint = EndpointConfig::new("people", "r");
        endpoint.allow_fields = vec!["name".into()];
        let body = RequestValidator::parse_body(json!({ "name": "a", "age": 1, "_id": "x" }).to_string().as_bytes()).unwrap();
        let err = RequestValidator::validate(&body, &endpoint).unwrap_err();
        assert_eq!(err.to_string(), "fields not allowed for endpoint 'people': age");
    }
}
