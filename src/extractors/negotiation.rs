//! Output format and API version from the `Accept` header.
//!
//! `Accept: application/xml; version=v2` selects XML output from version `v2`.

use crate::config::OutputFormat;
use axum::http::{header, HeaderMap};

fn accept_entries(headers: &HeaderMap) -> impl Iterator<Item = &str> {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Output format a single media type asks for. `application/json`, `text/json` and any
/// `+json` suffix select JSON; `application/xml`, `text/xml` and `+xml` suffixes other
/// than XHTML select XML.
fn media_format(media: &str) -> Option<OutputFormat> {
    let (kind, subtype) = media.split_once('/')?;
    match (kind, subtype) {
        ("application" | "text", "json") => Some(OutputFormat::Json),
        ("application" | "text", "xml") => Some(OutputFormat::Xml),
        (_, "xhtml+xml") => None,
        (_, s) if s.ends_with("+json") => Some(OutputFormat::Json),
        (_, s) if s.ends_with("+xml") => Some(OutputFormat::Xml),
        _ => None,
    }
}

/// First media type naming json or xml wins; anything else falls back to `default`.
pub fn negotiate_format(headers: &HeaderMap, default: OutputFormat) -> OutputFormat {
    accept_entries(headers)
        .map(|entry| entry.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .find_map(|media| media_format(&media))
        .unwrap_or(default)
}

/// Value of the first `version=` media type parameter.
pub fn requested_version(headers: &HeaderMap) -> Option<String> {
    accept_entries(headers)
        .flat_map(|entry| entry.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("version"))
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn accept(v: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::ACCEPT, HeaderValue::from_static(v));
        h
    }

    #[test]
    fn picks_first_known_format() {
        assert_eq!(negotiate_format(&accept("text/html, application/xml"), OutputFormat::Json), OutputFormat::Xml);
        assert_eq!(negotiate_format(&accept("application/vnd.api+json"), OutputFormat::Xml), OutputFormat::Json);
        assert_eq!(negotiate_format(&accept("*/*"), OutputFormat::Xml), OutputFormat::Xml);
        assert_eq!(negotiate_format(&HeaderMap::new(), OutputFormat::Json), OutputFormat::Json);
    }

    #[test]
    fn only_json_and_xml_media_types_count() {
        let browser = "text/html,application/xhtml+xml,image/avif,image/webp,*/*;q=0.8";
        assert_eq!(negotiate_format(&accept(browser), OutputFormat::Json), OutputFormat::Json);
        assert_eq!(negotiate_format(&accept("application/xmlish"), OutputFormat::Json), OutputFormat::Json);
        assert_eq!(negotiate_format(&accept("text/jsonp"), OutputFormat::Xml), OutputFormat::Xml);
        assert_eq!(negotiate_format(&accept("application/atom+xml"), OutputFormat::Json), OutputFormat::Xml);
        assert_eq!(negotiate_format(&accept("Text/XML; version=v1"), OutputFormat::Json), OutputFormat::Xml);
    }

    #[test]
    fn reads_version_parameter() {
        assert_eq!(requested_version(&accept("application/json; version=v2")).as_deref(), Some("v2"));
        assert_eq!(requested_version(&accept("application/json;charset=utf-8;Version=\"v1\"")).as_deref(), Some("v1"));
        assert_eq!(requested_version(&accept("application/json")), None);
    }
}
