//! Error types.
//!
//! Build-time problems surface as `Configuration` before any network I/O.
//! Transport failures and HTTP-level failures are separate variants so
//! callers can match on them; only the latter carries a response envelope.

use thiserror::Error;

use crate::types::{HttpMethod, ResponseEnvelope};

/// Errors produced while building or dispatching a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid input detected before any network I/O. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection, TLS, or timeout failure reported by the transport,
    /// surfaced verbatim.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The redirect hop limit was reached without a terminal response.
    #[error("Stopped following redirects after {hops} hops")]
    TooManyRedirects { hops: usize },

    /// The server answered with status 0 or >= 400.
    #[error(transparent)]
    Http(#[from] Box<HttpFailure>),
}

/// Structured failure for a terminal response with status 0 or >= 400.
#[derive(Debug, Error)]
#[error("{name}: {method} {path} returned {status}")]
pub struct HttpFailure {
    /// Reason phrase for the status with spaces removed, e.g. `NotFound`,
    /// or `UnknownHttpError` when the status has no known phrase.
    pub name: String,
    pub method: HttpMethod,
    /// The path exactly as the caller supplied it.
    pub path: String,
    pub status: u16,
    /// The drained response. Its body holds the UTF-8 text of the error
    /// payload when it decoded; `Empty` otherwise.
    pub response: ResponseEnvelope,
}

/// Reason phrase for a status code with spaces stripped.
pub fn reason_name(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(|reason| reason.replace(' ', ""))
        .unwrap_or_else(|| "UnknownHttpError".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseBody;

    #[test]
    fn reason_names_strip_spaces() {
        assert_eq!(reason_name(404), "NotFound");
        assert_eq!(reason_name(500), "InternalServerError");
        assert_eq!(reason_name(429), "TooManyRequests");
    }

    #[test]
    fn unknown_statuses_get_the_fallback_name() {
        assert_eq!(reason_name(0), "UnknownHttpError");
        assert_eq!(reason_name(599), "UnknownHttpError");
    }

    #[test]
    fn http_failure_renders_with_name_and_target() {
        let failure = HttpFailure {
            name: reason_name(404),
            method: HttpMethod::Get,
            path: "/user/address".to_string(),
            status: 404,
            response: ResponseEnvelope {
                status: 404,
                headers: reqwest::header::HeaderMap::new(),
                body: ResponseBody::Empty,
            },
        };
        assert_eq!(failure.to_string(), "NotFound: GET /user/address returned 404");

        let err = ClientError::from(Box::new(failure));
        assert!(matches!(err, ClientError::Http(_)));
    }
}
