//! Request construction.
//!
//! Turns `(method, path template, query, config)` into a concrete
//! descriptor: path parameters substituted, query placed in the URL or
//! encoded as a body, auth injected, headers merged in a fixed precedence
//! order, and the whole thing mounted under the API prefix.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    USER_AGENT,
};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ClientError;
use crate::types::{Auth, ClientConfig, HttpMethod, MultipartBody, Query};

/// Every request path is mounted under this prefix.
pub const API_PREFIX: &str = "/api/rest";

/// `:name` tokens, with the name delimited by `/` or `.`.
static PATH_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r":([^/.]+)").expect("valid pattern"));

/// A fully assembled request, ready for dispatch.
#[derive(Debug)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub payload: Payload,
}

/// Encoded request body.
#[derive(Debug)]
pub enum Payload {
    Empty,
    /// Newline-terminated JSON document.
    Json(Vec<u8>),
    /// Multipart form, rebuilt from owned parts at send time.
    Multipart(MultipartBody),
}

/// Build a request descriptor for `method` against `path`.
///
/// `path` may contain `:name` placeholders; a placeholder whose name is a
/// key of the query fields is substituted (consuming the key), any other
/// placeholder collapses to an empty string.
pub fn build(
    method: HttpMethod,
    path: &str,
    query: &Query,
    config: &ClientConfig,
) -> Result<RequestDescriptor, ClientError> {
    // Work on a copy; the caller's query is never mutated.
    let mut query = query.clone();

    // 1. Substitute path parameters from the query fields.
    let mut path = interpolate_path(path, &mut query);

    // 2. Default header set.
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("collective/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));

    // 3. Place the query in the URL or encode the body.
    let payload = match &query {
        Query::None => Payload::Empty,
        Query::Fields(fields) if method.query_in_url() => {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
            let encoded = encode_form_fields(fields);
            if !encoded.is_empty() {
                path = format!("{path}?{encoded}");
            }
            Payload::Empty
        }
        Query::Fields(fields) => {
            let mut body = serde_json::to_vec(fields).map_err(|e| {
                ClientError::Configuration(format!("Query fields are not serializable: {e}"))
            })?;
            body.push(b'\n');
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len() as u64));
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=utf-8"),
            );
            Payload::Json(body)
        }
        Query::Multipart(parts) => {
            // The transport computes the encoded form length; a stale zero
            // here would truncate the body.
            headers.remove(CONTENT_LENGTH);
            Payload::Multipart(parts.clone())
        }
    };

    // 4. Auth, applied after body encoding so oauth can extend the query
    //    string.
    match &config.auth {
        Some(Auth::OAuth { token }) => {
            let separator = if path.contains('?') { '&' } else { '?' };
            path = format!(
                "{path}{separator}access_token={}",
                urlencoding::encode(token)
            );
        }
        Some(Auth::Basic { username, password }) => {
            let credentials = BASE64.encode(format!("{username}:{password}"));
            let value = HeaderValue::from_str(&format!("Basic {credentials}")).map_err(|e| {
                ClientError::Configuration(format!("Invalid basic credentials: {e}"))
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Some(Auth::Bearer { bearer }) => {
            let value = HeaderValue::from_str(&format!("Bearer {bearer}"))
                .map_err(|e| ClientError::Configuration(format!("Invalid bearer token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        None => {}
    }

    // 5. Caller-supplied headers win over everything set so far.
    apply_header_overrides(&mut headers, &config.headers)?;

    // 6. Final target under the fixed API mount point.
    let url = format!(
        "{}://{}:{}{API_PREFIX}{path}",
        config.protocol.as_str(),
        config.host,
        config.port
    );

    Ok(RequestDescriptor {
        method,
        url,
        headers,
        payload,
    })
}

/// Single left-to-right pass over the path template. Matching keys are
/// consumed out of the field map; everything else becomes an empty string.
fn interpolate_path(path: &str, query: &mut Query) -> String {
    let Query::Fields(fields) = query else {
        return PATH_TOKEN.replace_all(path, "").into_owned();
    };
    PATH_TOKEN
        .replace_all(path, |caps: &Captures<'_>| match fields.remove(&caps[1]) {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        })
        .into_owned()
}

/// Percent-encoded `key=value` pairs joined with `&`.
fn encode_form_fields(fields: &serde_json::Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Merge caller header overrides into `headers`, replacing on collision.
fn apply_header_overrides(
    headers: &mut HeaderMap,
    overrides: &HashMap<String, String>,
) -> Result<(), ClientError> {
    for (key, value) in overrides {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| ClientError::Configuration(format!("Invalid header name '{key}': {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ClientError::Configuration(format!("Invalid header value for '{key}': {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(())
}
