//! Standard response envelope helpers, rendered as JSON or XML.

use crate::config::OutputFormat;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Single document response with the given status.
pub fn success_one<T: Serialize>(format: OutputFormat, status: StatusCode, data: T) -> Response {
    let envelope = SuccessOne { data, meta: None };
    render_serializable(format, status, &envelope)
}

pub fn success_many<T: Serialize>(format: OutputFormat, data: Vec<T>) -> Response {
    let count = data.len() as u64;
    let envelope = SuccessMany {
        data,
        meta: MetaCount { count },
    };
    render_serializable(format, StatusCode::OK, &envelope)
}

/// Status only, no body (204 for update and delete).
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

pub fn error_body(code: &str, message: String, details: Option<serde_json::Value>) -> serde_json::Value {
    let mut error = serde_json::json!({
        "code": code,
        "message": message,
    });
    if let Some(details) = details {
        error["details"] = details;
    }
    serde_json::json!({ "error": error })
}

fn render_serializable<T: Serialize>(format: OutputFormat, status: StatusCode, body: &T) -> Response {
    match serde_json::to_value(body) {
        Ok(v) => render_value(format, status, Some(&v)),
        Err(e) => {
            tracing::error!(error = %e, "response serialization failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Render a JSON tree in the requested format. `None` yields an empty body.
pub fn render_value(format: OutputFormat, status: StatusCode, body: Option<&Value>) -> Response {
    let Some(body) = body else {
        return status.into_response();
    };
    match format {
        OutputFormat::Json => (status, Json(body)).into_response(),
        OutputFormat::Xml => match to_xml(body) {
            Ok(xml) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"))],
                xml,
            )
                .into_response(),
            Err(e) => {
                tracing::error!(error = %e, "xml encoding failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
    }
}

pub type XmlResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Encode a JSON tree as XML under a `<response>` root. Object keys become elements,
/// array items become `<item>` elements, and keys that are not valid element names
/// become `<entry key="...">`.
pub fn to_xml(value: &Value) -> XmlResult<String> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, "response", value)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_element(writer: &mut Writer<Vec<u8>>, key: &str, value: &Value) -> XmlResult<()> {
    let (name, key_attr) = if is_xml_name(key) { (key, None) } else { ("entry", Some(key)) };
    let mut start = BytesStart::new(name);
    if let Some(k) = key_attr {
        start.push_attribute(("key", &*xml_safe(k)));
    }

    if value.is_null() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                write_element(writer, k, v)?;
            }
        }
        Value::Array(items) => {
            for v in items {
                write_element(writer, "item", v)?;
            }
        }
        Value::String(s) => {
            writer.write_event(Event::Text(BytesText::new(&xml_safe(s))))?;
        }
        Value::Bool(b) => {
            writer.write_event(Event::Text(BytesText::new(if *b { "true" } else { "false" })))?;
        }
        Value::Number(n) => {
            writer.write_event(Event::Text(BytesText::new(&n.to_string())))?;
        }
        Value::Null => {}
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Drop characters XML 1.0 cannot carry: C0 controls other than tab, newline and
/// carriage return, plus U+FFFE and U+FFFF.
fn xml_safe(s: &str) -> Cow<'_, str> {
    fn allowed(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    }
    if s.chars().all(allowed) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| allowed(c)).collect())
    }
}

fn is_xml_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    if s.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("xml")) {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
