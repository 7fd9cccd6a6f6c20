//! Injectable diagnostics for the dispatcher.
//!
//! The dispatcher takes zero or more interceptors at construction and
//! notifies them at each lifecycle point. Every hook is infallible and
//! fire-and-forget, so diagnostics can never affect a call's outcome.

use tracing::debug;

use crate::error::ClientError;
use crate::types::HttpMethod;

/// Context handed to every diagnostic hook.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: HttpMethod,
    pub url: String,
}

/// Observes the lifecycle of a dispatch. All hooks default to no-ops.
pub trait RequestInterceptor: Send + Sync {
    /// A request descriptor is about to be sent.
    fn on_request(&self, _ctx: &RequestContext) {}

    /// A redirect hop is being followed; `hop` counts from 1.
    fn on_redirect(&self, _ctx: &RequestContext, _location: &str, _hop: usize) {}

    /// The call resolved with a terminal, non-error response.
    fn on_response(&self, _ctx: &RequestContext, _status: u16) {}

    /// The call is rejecting with `error`.
    fn on_error(&self, _ctx: &RequestContext, _error: &ClientError) {}
}

/// Forwards every lifecycle event to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInterceptor;

impl RequestInterceptor for TracingInterceptor {
    fn on_request(&self, ctx: &RequestContext) {
        debug!(method = %ctx.method, url = %ctx.url, "dispatching request");
    }

    fn on_redirect(&self, ctx: &RequestContext, location: &str, hop: usize) {
        debug!(url = %ctx.url, location, hop, "following redirect");
    }

    fn on_response(&self, ctx: &RequestContext, status: u16) {
        debug!(url = %ctx.url, status, "request resolved");
    }

    fn on_error(&self, ctx: &RequestContext, error: &ClientError) {
        debug!(url = %ctx.url, error = %error, "request failed");
    }
}
