//! Rendering helpers for captured requests and responses.
//!
//! Header text, sensitive-value masking, content-type inspection, and
//! body decoding all live here. Everything in this module is fail-soft:
//! undecodable input falls back to a raw rendition, never an error.

use crate::config::InspectConfig;
use http::HeaderMap;

/// Replacement text for sensitive header values.
pub(crate) const MASK: &str = "******";

/// Render headers as one `name: value` line per header.
///
/// When `redact` is given, values of sensitive headers are replaced
/// with [`MASK`]. Header names come out lowercase (the `http` crate
/// normalizes them on insertion).
pub(crate) fn header_lines(headers: &HeaderMap, redact: Option<&InspectConfig>) -> String {
    let mut lines = Vec::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let masked = redact.is_some_and(|config| config.is_sensitive_header(name.as_str()));
        let value = if masked {
            MASK.to_string()
        } else {
            match value.to_str() {
                Ok(text) => text.to_string(),
                // Opaque bytes; render what we can.
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            }
        };
        lines.push(format!("{}: {}", name.as_str(), value));
    }
    lines.join("\n")
}

/// Extract the content-type essence (media type without parameters),
/// lowercased. `application/json; charset=utf-8` yields `application/json`.
pub(crate) fn content_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(http::header::CONTENT_TYPE)?;
    let text = value.to_str().ok()?;
    let essence = text.split(';').next()?.trim();
    if essence.is_empty() {
        return None;
    }
    Some(essence.to_ascii_lowercase())
}

/// Whether a content-type essence denotes JSON.
///
/// Matches `application/json` and structured-syntax variants such as
/// `application/hal+json` (media type `application`, subtype whose final
/// `+`-segment is `json`).
pub(crate) fn is_json(essence: &str) -> bool {
    let Some((media, sub)) = essence.split_once('/') else {
        return false;
    };
    media == "application" && sub.rsplit('+').next() == Some("json")
}

/// Pretty-print a JSON document with sorted keys.
///
/// Returns `None` when the input is not valid JSON; callers fall back
/// to the raw body.
pub(crate) fn pretty_json(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Decode a request or response body for display.
///
/// JSON bodies (per the content-type of `headers`) are pretty-printed
/// with sorted keys; anything that fails to parse is returned as-is.
/// Other bodies are UTF-8 decoded, lossily when needed.
pub(crate) fn decode_body(headers: &HeaderMap, body: &[u8]) -> String {
    if body.is_empty() {
        return String::new();
    }

    let text = match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };

    if content_type(headers).as_deref().is_some_and(is_json) {
        match pretty_json(&text) {
            Some(pretty) => pretty,
            None => {
                tracing::debug!("body declared as json did not parse; keeping raw body");
                text
            }
        }
    } else {
        text
    }
}
