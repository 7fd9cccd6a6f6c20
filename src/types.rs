//! Core request and response types.
//!
//! Everything here is created fresh per call and consumed within one
//! dispatch (or one redirect chain of dispatches). The dispatcher clones
//! `ClientConfig` and `Query` before touching them, so caller state is
//! never mutated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

/// HTTP verbs accepted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Head,
    Delete,
}

impl HttpMethod {
    /// Verbs that carry their query data in the URL instead of the body.
    pub fn query_in_url(self) -> bool {
        matches!(self, Self::Get | Self::Delete | Self::Head)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Delete => "DELETE",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl FromStr for HttpMethod {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, ClientError> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "DELETE" => Ok(Self::Delete),
            other => Err(ClientError::Configuration(format!(
                "Only methods supported are GET, POST, PUT, DELETE, HEAD, and PATCH (got `{other}`)"
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported URL schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl FromStr for Protocol {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, ClientError> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ClientError::Configuration(
                "Only http and https are supported.".to_string(),
            )),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication schemes understood by the request builder.
///
/// Deserializes from a tagged object such as
/// `{"type": "basic", "username": "...", "password": "..."}`. An
/// unrecognized tag fails deserialization, before any request is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Auth {
    /// Appends `access_token=<token>` to the request query string.
    OAuth { token: String },
    /// Sets `authorization: Basic <base64(username:password)>`.
    Basic { username: String, password: String },
    /// Sets `authorization: Bearer <token>`.
    Bearer { bearer: String },
}

/// Request payload, chosen explicitly by the caller.
///
/// GET/DELETE/HEAD place `Fields` in the URL query string; other verbs
/// serialize them as a JSON body. `Multipart` is always a streamed body.
#[derive(Debug, Clone, Default)]
pub enum Query {
    /// No query string and no body.
    #[default]
    None,
    /// Key/value fields; also the source for path-parameter interpolation.
    Fields(serde_json::Map<String, Value>),
    /// Ordered multipart fields for file-upload requests.
    Multipart(MultipartBody),
}

impl Query {
    /// Build a `Fields` query from a JSON object literal.
    pub fn fields(value: Value) -> Result<Self, ClientError> {
        match value {
            Value::Object(map) => Ok(Self::Fields(map)),
            _ => Err(ClientError::Configuration(
                "Query must be a JSON object or null".to_string(),
            )),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<serde_json::Map<String, Value>> for Query {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self::Fields(map)
    }
}

impl From<MultipartBody> for Query {
    fn from(body: MultipartBody) -> Self {
        Self::Multipart(body)
    }
}

/// An ordered collection of named multipart fields.
///
/// Parts are stored owned so the wire form can be rebuilt when a redirect
/// re-dispatches the request.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    parts: Vec<MultipartPart>,
}

#[derive(Debug, Clone)]
enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        data: Vec<u8>,
        file_name: String,
        mime: Option<String>,
    },
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a binary file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        data: Vec<u8>,
        file_name: impl Into<String>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartPart::File {
            name: name.into(),
            data,
            file_name: file_name.into(),
            mime,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Build the wire form. Called once per dispatch attempt.
    pub(crate) fn to_form(&self) -> Result<reqwest::multipart::Form, ClientError> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartPart::File {
                    name,
                    data,
                    file_name,
                    mime,
                } => {
                    let mut wire_part = reqwest::multipart::Part::bytes(data.clone())
                        .file_name(file_name.clone());
                    if let Some(mime) = mime {
                        wire_part = wire_part.mime_str(mime).map_err(|e| {
                            ClientError::Configuration(format!("Invalid mime type `{mime}`: {e}"))
                        })?;
                    }
                    form.part(name.clone(), wire_part)
                }
            };
        }
        Ok(form)
    }
}

/// Connection settings for a call.
///
/// Cloned by the dispatcher before use; redirect hops rewrite only the
/// clone's protocol, host, and port.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// Request timeout, applied only when set.
    pub timeout: Option<Duration>,
    pub auth: Option<Auth>,
    /// Caller-supplied header overrides, applied last in the header merge.
    pub headers: HashMap<String, String>,
    /// Whether 301/302/307 responses are re-dispatched automatically.
    pub follow_redirects: bool,
    /// Redirect hop limit.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Https,
            host: "localhost".to_string(),
            port: 8080,
            timeout: None,
            auth: None,
            headers: HashMap::new(),
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// A response as seen by the caller, with the body in whatever stage of
/// materialization the call surface produced.
#[derive(Debug)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    pub body: ResponseBody,
}

/// Progressive body states: live stream, raw bytes, then decoded JSON.
#[derive(Debug)]
pub enum ResponseBody {
    /// Nothing attached: HEAD responses, empty bodies, or an error body
    /// that did not decode as UTF-8.
    Empty,
    /// The live, still-streaming response.
    Stream(reqwest::Response),
    /// The fully drained body.
    Bytes(bytes::Bytes),
    /// Body decoded as JSON.
    Json(Value),
    /// UTF-8 text, either a drained error body or the fallback when JSON
    /// decoding fails.
    Text(String),
}

impl ResponseBody {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}
