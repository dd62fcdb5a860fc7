//! Decoding of provider response bodies.
//!
//! The strategy is selected by the media type of the `Content-Type` header:
//! `application/json` bodies are parsed as JSON objects, anything else as a
//! URL-encoded form.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

use super::error::MalformedResponse;

/// Returns `true` if the media type, before any `;` parameter, is `application/json`.
pub fn is_json(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| {
            media_type
                .trim()
                .eq_ignore_ascii_case(mime::APPLICATION_JSON.essence_str())
        })
}

/// Decodes a response body into a mapping.
///
/// An empty or blank body yields an empty mapping whatever the content
/// type, so an empty body declared as `application/json` is not an
/// [`MalformedResponse::InvalidJson`]. With duplicated form keys, the last
/// value wins.
///
/// # Errors
///
/// Returns [`MalformedResponse`] if the body cannot be parsed with the
/// selected strategy, or if a JSON body is not an object.
pub fn decode(body: &str, content_type: Option<&str>) -> Result<Map<String, Value>, MalformedResponse> {
    if body.trim().is_empty() {
        return Ok(Map::new());
    }

    if is_json(content_type) {
        decode_json(body)
    } else {
        decode_form(body)
    }
}

fn decode_json(body: &str) -> Result<Map<String, Value>, MalformedResponse> {
    let value = serde_json::from_str::<Value>(body).map_err(|err| MalformedResponse::InvalidJson {
        reason: err.to_string(),
        body: body.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(MalformedResponse::NotAnObject {
            body: body.to_string(),
        }),
    }
}

fn decode_form(body: &str) -> Result<Map<String, Value>, MalformedResponse> {
    body.trim()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            Ok::<_, MalformedResponse>((
                form_decode(name, body)?,
                Value::String(form_decode(value, body)?),
            ))
        })
        .collect()
}

/// Decodes one form component; invalid UTF-8 is rejected rather than replaced.
fn form_decode(component: &str, body: &str) -> Result<String, MalformedResponse> {
    let component = component.replace('+', " ");
    percent_decode_str(&component)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|err| MalformedResponse::InvalidForm {
            reason: err.to_string(),
            body: body.to_string(),
        })
}

/// Reads a string value, stringifying numbers and booleans.
pub(crate) fn string_value(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}
