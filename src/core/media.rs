//! Content negotiation
//!
//! Responses are rendered as HTML or JSON. The media type comes from the
//! first range of the `Accept` header, an `accept` query parameter overrides
//! it, and anything unparseable, empty or `*/*` falls back to HTML. Only
//! utf-8 is served.

use crate::core::error::{DecodeError, HttpError};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode, Uri};
use std::collections::HashMap;
use std::fmt;

/// A media type this crate can render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Media {
    Html,
    Json,
}

impl Media {
    pub fn as_str(&self) -> &'static str {
        match self {
            Media::Html => "text/html",
            Media::Json => "application/json",
        }
    }

    /// Value of the `Content-Type` header for a rendered response
    pub fn content_type(&self) -> &'static str {
        match self {
            Media::Html => "text/html; charset=UTF-8",
            Media::Json => "application/json; charset=UTF-8",
        }
    }

    fn from_essence(essence: &str) -> Option<Self> {
        match essence {
            "text/html" => Some(Media::Html),
            "application/json" => Some(Media::Json),
            _ => None,
        }
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of negotiating a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub media: Media,
    pub charset: String,
}

/// A parsed media type: lowercased essence plus parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    pub essence: String,
    pub params: HashMap<String, String>,
}

impl MediaType {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Parse the first media range of a header value
///
/// Returns `None` when the value is not of the form `type/subtype`.
pub fn parse_media_type(raw: &str) -> Option<MediaType> {
    let first = raw.split(',').next()?;
    let mut parts = first.split(';');
    let essence = parts.next()?.trim().to_ascii_lowercase();
    let (kind, subtype) = essence.split_once('/')?;
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return None;
    }

    let mut params = HashMap::new();
    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"');
        params.insert(name.trim().to_ascii_lowercase(), value.to_string());
    }
    Some(MediaType { essence, params })
}

/// Pick the response media and charset for a request
pub fn negotiate(headers: &HeaderMap, uri: &Uri) -> Result<Negotiated, HttpError> {
    let accept = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_media_type)
        .filter(|m| m.essence != "*/*");

    let (mut essence, charset) = match accept {
        Some(m) => {
            let charset = m.param("charset").unwrap_or("utf-8").to_string();
            (m.essence, charset)
        }
        None => ("text/html".to_string(), "utf-8".to_string()),
    };

    if let Some(query) = uri.query() {
        let overridden = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, v)| k == "accept" && !v.is_empty())
            .map(|(_, v)| v.into_owned());
        if let Some(value) = overridden {
            essence = value;
        }
    }

    let media = Media::from_essence(&essence).ok_or_else(|| {
        HttpError::new(
            "only accepts text/html or application/json requests",
            StatusCode::NOT_ACCEPTABLE,
        )
    })?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return Err(HttpError::new(
            "only accepts utf-8 requests",
            StatusCode::NOT_ACCEPTABLE,
        ));
    }
    Ok(Negotiated {
        media,
        charset: charset.to_ascii_lowercase(),
    })
}

/// Check that a request body is utf-8 JSON
pub fn check_json_body(headers: &HeaderMap) -> Result<(), DecodeError> {
    let raw = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let media = parse_media_type(raw).ok_or_else(|| DecodeError::UnsupportedMedia(raw.to_string()))?;
    if let Some(charset) = media.param("charset") {
        if !charset.is_empty() && !charset.eq_ignore_ascii_case("utf-8") {
            return Err(DecodeError::UnsupportedCharset(charset.to_string()));
        }
    }
    if media.essence != "application/json" {
        return Err(DecodeError::UnsupportedMedia(media.essence));
    }
    Ok(())
}
