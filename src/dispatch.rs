//! Request dispatch.
//!
//! Sends a built descriptor over a per-call transport, follows the
//! 301/302/307 class with a bounded re-dispatch loop, drains error bodies
//! into structured failures, and otherwise resolves with the live response
//! stream.

use std::sync::Arc;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;

use crate::builder::{self, Payload, RequestDescriptor};
use crate::error::{ClientError, HttpFailure, reason_name};
use crate::interceptor::{RequestContext, RequestInterceptor};
use crate::types::{ClientConfig, HttpMethod, Query, ResponseBody, ResponseEnvelope};

/// Statuses that trigger a transparent re-dispatch.
const REDIRECT_STATUSES: [u16; 3] = [301, 302, 307];

/// Sends requests and settles them into response envelopes.
///
/// Holds only diagnostics collaborators; every dispatch clones its own
/// configuration, so concurrent calls share no mutable state.
#[derive(Default)]
pub struct Dispatcher {
    interceptors: Vec<Arc<dyn RequestInterceptor>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a diagnostics collaborator. May be called repeatedly.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Dispatch one logical request.
    ///
    /// A 301/302/307 answer re-enters the loop with the clone's protocol,
    /// host, and port rewritten from the `location` header, reissuing the
    /// same method, path template, and query, up to
    /// `config.max_redirects` hops.
    pub async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Query,
        config: &ClientConfig,
    ) -> Result<ResponseEnvelope, ClientError> {
        let mut config = config.clone();
        let mut hops = 0usize;

        loop {
            let descriptor = builder::build(method, path, query, &config)?;
            let ctx = RequestContext {
                method,
                url: descriptor.url.clone(),
            };
            self.notify(|it| it.on_request(&ctx));

            let response = match send(&descriptor, &config).await {
                Ok(response) => response,
                Err(error) => {
                    self.notify(|it| it.on_error(&ctx, &error));
                    return Err(error);
                }
            };
            let status = response.status().as_u16();

            if REDIRECT_STATUSES.contains(&status) && config.follow_redirects {
                hops += 1;
                if hops > config.max_redirects {
                    let error = ClientError::TooManyRedirects {
                        hops: config.max_redirects,
                    };
                    self.notify(|it| it.on_error(&ctx, &error));
                    return Err(error);
                }
                let location = match redirect_target(&response) {
                    Ok(location) => location,
                    Err(error) => {
                        self.notify(|it| it.on_error(&ctx, &error));
                        return Err(error);
                    }
                };
                self.notify(|it| it.on_redirect(&ctx, location.as_str(), hops));
                if let Err(error) = apply_redirect(&mut config, &location) {
                    self.notify(|it| it.on_error(&ctx, &error));
                    return Err(error);
                }
                continue;
            }

            if status == 0 || status >= 400 {
                let failure = drain_failure(method, path, response).await?;
                let error = ClientError::from(Box::new(failure));
                self.notify(|it| it.on_error(&ctx, &error));
                return Err(error);
            }

            self.notify(|it| it.on_response(&ctx, status));
            return Ok(ResponseEnvelope {
                status,
                headers: response.headers().clone(),
                body: ResponseBody::Stream(response),
            });
        }
    }

    fn notify(&self, hook: impl Fn(&dyn RequestInterceptor)) {
        for interceptor in &self.interceptors {
            hook(interceptor.as_ref());
        }
    }
}

/// One transport attempt: fresh client, write the descriptor, await the
/// status line and headers.
async fn send(
    descriptor: &RequestDescriptor,
    config: &ClientConfig,
) -> Result<reqwest::Response, ClientError> {
    // The dispatch loop owns redirect semantics; the transport must not
    // follow hops on its own.
    let mut client = reqwest::Client::builder().redirect(Policy::none());
    if let Some(timeout) = config.timeout {
        client = client.timeout(timeout);
    }
    let client = client
        .build()
        .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {e}")))?;

    let mut request = client
        .request(descriptor.method.to_reqwest(), &descriptor.url)
        .headers(descriptor.headers.clone());
    request = match &descriptor.payload {
        Payload::Empty => request,
        Payload::Json(body) => request.body(body.clone()),
        Payload::Multipart(parts) => request.multipart(parts.to_form()?),
    };

    request
        .send()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))
}

fn redirect_target(response: &reqwest::Response) -> Result<reqwest::Url, ClientError> {
    let raw = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ClientError::Transport("Redirect response without a location header".to_string())
        })?;
    reqwest::Url::parse(raw)
        .map_err(|e| ClientError::Transport(format!("Invalid redirect location `{raw}`: {e}")))
}

/// Point the config at the redirect target. Only protocol, host, and port
/// move; the path template and query are reissued as given.
fn apply_redirect(config: &mut ClientConfig, location: &reqwest::Url) -> Result<(), ClientError> {
    config.protocol = location.scheme().parse()?;
    config.host = location
        .host_str()
        .ok_or_else(|| {
            ClientError::Transport(format!("Redirect location `{location}` has no host"))
        })?
        .to_string();
    if let Some(port) = location.port_or_known_default() {
        config.port = port;
    }
    Ok(())
}

/// Drain the body of a failed response and build the structured failure.
/// A body that is not valid UTF-8 is dropped; the other fields still
/// populate.
async fn drain_failure(
    method: HttpMethod,
    path: &str,
    response: reqwest::Response,
) -> Result<HttpFailure, ClientError> {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let buffer = response
        .bytes()
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    let body = match String::from_utf8(buffer.to_vec()) {
        Ok(text) => ResponseBody::Text(text),
        Err(_) => ResponseBody::Empty,
    };
    Ok(HttpFailure {
        name: reason_name(status),
        method,
        path: path.to_string(),
        status,
        response: ResponseEnvelope {
            status,
            headers,
            body,
        },
    })
}
